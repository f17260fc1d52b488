//! Database operations for the `product_analyses` table.

use chrono::{DateTime, Utc};
use listingseo_core::{Analysis, AnalysisFilter, AnalysisStatus, NewAnalysis};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `product_analyses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_features: Option<String>,
    pub category: Option<String>,
    /// One of `amazon`, `flipkart`, `meesho` (enforced by a CHECK constraint).
    pub target_platform: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = DbError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let marketplace = row
            .target_platform
            .parse()
            .map_err(|_| DbError::InvalidColumn {
                column: "target_platform",
                value: row.target_platform.clone(),
            })?;
        let status = row.status.parse().map_err(|_| DbError::InvalidColumn {
            column: "status",
            value: row.status.clone(),
        })?;

        Ok(Analysis {
            id: row.id,
            owner_id: row.owner_id,
            product_name: row.product_name,
            product_description: row.product_description,
            product_features: row.product_features,
            category: row.category,
            marketplace,
            status,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

const ANALYSIS_COLUMNS: &str = "id, owner_id, product_name, product_description, product_features, \
     category, target_platform, status, created_at, completed_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a new analysis in `pending` status and return the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_analysis(pool: &PgPool, new: &NewAnalysis) -> Result<AnalysisRow, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "INSERT INTO product_analyses \
             (id, owner_id, product_name, product_description, product_features, category, \
              target_platform, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending') \
         RETURNING {ANALYSIS_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(new.owner_id)
    .bind(new.product_name.trim())
    .bind(new.product_description.as_deref())
    .bind(new.product_features.as_deref())
    .bind(new.category.as_deref())
    .bind(new.marketplace.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single analysis by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis(pool: &PgPool, id: Uuid) -> Result<Option<AnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM product_analyses WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List analyses matching the optional owner/status filter, newest first,
/// along with the total number of matching rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_analyses(
    pool: &PgPool,
    filter: &AnalysisFilter,
) -> Result<(Vec<AnalysisRow>, i64), DbError> {
    let status = filter.status.map(AnalysisStatus::as_str);

    let rows = sqlx::query_as::<_, AnalysisRow>(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM product_analyses \
         WHERE ($1::uuid IS NULL OR owner_id = $1) \
           AND ($2::text IS NULL OR status = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(filter.owner_id)
    .bind(status)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM product_analyses \
         WHERE ($1::uuid IS NULL OR owner_id = $1) \
           AND ($2::text IS NULL OR status = $2)",
    )
    .bind(filter.owner_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

/// Count analyses an owner created in the half-open window `[from, to)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_analyses_created_between(
    pool: &PgPool,
    owner_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM product_analyses \
         WHERE owner_id = $1 AND created_at >= $2 AND created_at < $3",
    )
    .bind(owner_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Ids of `pending` analyses created before `created_before`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stale_pending(
    pool: &PgPool,
    created_before: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM product_analyses \
         WHERE status = 'pending' AND created_at < $1 \
         ORDER BY created_at ASC \
         LIMIT $2",
    )
    .bind(created_before)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Conditionally move an analysis from `from` to `to`.
///
/// The `WHERE status = $from` guard makes the update a compare-and-set, so a
/// terminal analysis can never be re-entered. `completed_at` is stamped only
/// on the transition into `completed`.
///
/// Returns `true` if a row was updated.
///
/// # Errors
///
/// Returns [`DbError::IllegalTransition`] for pairs outside the lifecycle
/// (nothing is sent to the database), or [`DbError::Sqlx`] if the update fails.
pub async fn transition_status(
    pool: &PgPool,
    id: Uuid,
    from: AnalysisStatus,
    to: AnalysisStatus,
) -> Result<bool, DbError> {
    if !from.can_transition_to(to) {
        return Err(DbError::IllegalTransition { from, to });
    }

    let result = sqlx::query(
        "UPDATE product_analyses \
         SET status = $1, \
             completed_at = CASE WHEN $1 = 'completed' THEN NOW() ELSE completed_at END \
         WHERE id = $2 AND status = $3",
    )
    .bind(to.as_str())
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
