//! Database operations for the `keyword_metrics` table.

use chrono::{DateTime, Utc};
use listingseo_core::KeywordMetric;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `keyword_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordMetricRow {
    pub analysis_id: Uuid,
    pub keyword: String,
    pub avg_interest: i32,
    pub momentum: i32,
    pub samples: Vec<i32>,
    pub volume_estimate: i32,
    pub cpc_estimate: Option<Decimal>,
    pub badge: String,
    pub reason: String,
    pub recommendation: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<KeywordMetricRow> for KeywordMetric {
    type Error = DbError;

    fn try_from(row: KeywordMetricRow) -> Result<Self, Self::Error> {
        let badge = row.badge.parse().map_err(|_| DbError::InvalidColumn {
            column: "badge",
            value: row.badge.clone(),
        })?;
        let recommendation = row
            .recommendation
            .parse()
            .map_err(|_| DbError::InvalidColumn {
                column: "recommendation",
                value: row.recommendation.clone(),
            })?;

        Ok(KeywordMetric {
            keyword: row.keyword,
            avg_interest: row.avg_interest,
            momentum: row.momentum,
            samples: row.samples,
            volume_estimate: row.volume_estimate,
            cpc_estimate: row.cpc_estimate,
            badge,
            reason: row.reason,
            recommendation,
        })
    }
}

/// Insert or overwrite metrics keyed by `(analysis_id, keyword)`.
///
/// All rows are written in one transaction; a refresh never leaves a partial
/// set behind.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn upsert_keyword_metrics(
    pool: &PgPool,
    analysis_id: Uuid,
    metrics: &[KeywordMetric],
) -> Result<(), DbError> {
    if metrics.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for metric in metrics {
        sqlx::query(
            "INSERT INTO keyword_metrics \
                 (id, analysis_id, keyword, avg_interest, momentum, samples, volume_estimate, \
                  cpc_estimate, badge, reason, recommendation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (analysis_id, keyword) DO UPDATE SET \
                 avg_interest = EXCLUDED.avg_interest, \
                 momentum = EXCLUDED.momentum, \
                 samples = EXCLUDED.samples, \
                 volume_estimate = EXCLUDED.volume_estimate, \
                 cpc_estimate = EXCLUDED.cpc_estimate, \
                 badge = EXCLUDED.badge, \
                 reason = EXCLUDED.reason, \
                 recommendation = EXCLUDED.recommendation, \
                 updated_at = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(analysis_id)
        .bind(&metric.keyword)
        .bind(metric.avg_interest)
        .bind(metric.momentum)
        .bind(&metric.samples)
        .bind(metric.volume_estimate)
        .bind(metric.cpc_estimate)
        .bind(metric.badge.as_str())
        .bind(&metric.reason)
        .bind(metric.recommendation.as_str())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Persisted metrics for an analysis, highest interest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keyword_metrics(
    pool: &PgPool,
    analysis_id: Uuid,
) -> Result<Vec<KeywordMetricRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordMetricRow>(
        "SELECT analysis_id, keyword, avg_interest, momentum, samples, volume_estimate, \
                cpc_estimate, badge, reason, recommendation, updated_at \
         FROM keyword_metrics \
         WHERE analysis_id = $1 \
         ORDER BY avg_interest DESC, momentum DESC, keyword ASC",
    )
    .bind(analysis_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
