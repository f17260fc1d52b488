//! Database operations for the `competitor_data` table.

use chrono::{DateTime, Utc};
use listingseo_core::{CompetitorListing, NewCompetitorListing};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `competitor_data` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub competitor_title: String,
    pub competitor_url: String,
    pub extracted_keywords: Vec<String>,
    pub ranking_position: Option<i32>,
    /// `NUMERIC(12,2)`.
    pub price: Option<Decimal>,
    pub rating: Option<f32>,
    pub scraped_at: DateTime<Utc>,
}

impl From<CompetitorRow> for CompetitorListing {
    fn from(row: CompetitorRow) -> Self {
        CompetitorListing {
            id: row.id,
            analysis_id: row.analysis_id,
            title: row.competitor_title,
            url: row.competitor_url,
            keywords: row.extracted_keywords,
            ranking_position: row.ranking_position,
            price: row.price,
            rating: row.rating,
            scraped_at: row.scraped_at,
        }
    }
}

/// All competitor rows for an analysis, in ranking order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors(
    pool: &PgPool,
    analysis_id: Uuid,
) -> Result<Vec<CompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, analysis_id, competitor_title, competitor_url, extracted_keywords, \
                ranking_position, price, rating, scraped_at \
         FROM competitor_data \
         WHERE analysis_id = $1 \
         ORDER BY ranking_position ASC NULLS LAST, scraped_at ASC, id ASC",
    )
    .bind(analysis_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert competitor rows for an analysis unless some already exist.
///
/// Runs in one transaction holding a transaction-scoped advisory lock keyed
/// on the analysis id, so two concurrent workflow runs for the same analysis
/// cannot both insert. `ranking_position` is the 1-based index in `listings`.
///
/// Returns `true` if the rows were inserted, `false` if the analysis already
/// had competitor data.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back in that case.
pub async fn insert_competitors_if_absent(
    pool: &PgPool,
    analysis_id: Uuid,
    listings: &[NewCompetitorListing],
) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(analysis_id.to_string())
        .execute(&mut *tx)
        .await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM competitor_data WHERE analysis_id = $1)")
            .bind(analysis_id)
            .fetch_one(&mut *tx)
            .await?;

    if exists {
        tracing::debug!(%analysis_id, "competitor data already present; skipping insert");
        tx.rollback().await?;
        return Ok(false);
    }

    for (index, listing) in listings.iter().enumerate() {
        let position = i32::try_from(index + 1).unwrap_or(i32::MAX);
        sqlx::query(
            "INSERT INTO competitor_data \
                 (id, analysis_id, competitor_title, competitor_url, extracted_keywords, \
                  ranking_position, price, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(analysis_id)
        .bind(&listing.title)
        .bind(&listing.url)
        .bind(&listing.keywords)
        .bind(position)
        .bind(listing.price)
        .bind(listing.rating)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(true)
}
