//! Database operations for the `generated_content` table.

use chrono::{DateTime, Utc};
use listingseo_core::{GeneratedContent, NewGeneratedContent};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `generated_content` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeneratedContentRow {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub optimized_title: String,
    pub optimized_description: String,
    pub recommended_keywords: Vec<String>,
    pub seo_score: i32,
    pub gemini_prompt: String,
    pub gemini_response: String,
    pub created_at: DateTime<Utc>,
}

impl From<GeneratedContentRow> for GeneratedContent {
    fn from(row: GeneratedContentRow) -> Self {
        GeneratedContent {
            id: row.id,
            analysis_id: row.analysis_id,
            optimized_title: row.optimized_title,
            optimized_description: row.optimized_description,
            recommended_keywords: row.recommended_keywords,
            seo_score: row.seo_score,
            prompt: row.gemini_prompt,
            raw_response: row.gemini_response,
            created_at: row.created_at,
        }
    }
}

const CONTENT_COLUMNS: &str = "id, analysis_id, optimized_title, optimized_description, \
     recommended_keywords, seo_score, gemini_prompt, gemini_response, created_at";

/// Insert a new generation attempt and return the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_generated_content(
    pool: &PgPool,
    analysis_id: Uuid,
    content: &NewGeneratedContent,
) -> Result<GeneratedContentRow, DbError> {
    let row = sqlx::query_as::<_, GeneratedContentRow>(&format!(
        "INSERT INTO generated_content \
             (id, analysis_id, optimized_title, optimized_description, recommended_keywords, \
              seo_score, gemini_prompt, gemini_response) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {CONTENT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(analysis_id)
    .bind(&content.optimized_title)
    .bind(&content.optimized_description)
    .bind(&content.recommended_keywords)
    .bind(content.seo_score)
    .bind(&content.prompt)
    .bind(&content.raw_response)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Return the most recent generation attempt for an analysis, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_generated_content(
    pool: &PgPool,
    analysis_id: Uuid,
) -> Result<Option<GeneratedContentRow>, DbError> {
    let row = sqlx::query_as::<_, GeneratedContentRow>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM generated_content \
         WHERE analysis_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1"
    ))
    .bind(analysis_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
