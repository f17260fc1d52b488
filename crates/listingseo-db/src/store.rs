//! [`AnalysisStore`] backed by Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listingseo_core::{
    Analysis, AnalysisFilter, AnalysisPage, AnalysisStatus, AnalysisStore, CompetitorListing,
    GeneratedContent, KeywordMetric, NewAnalysis, NewCompetitorListing, NewGeneratedContent,
    StoreError,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Postgres-backed store. Cheap to clone; shares the underlying pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::ping(&self.pool)
            .await
            .map_err(|e| DbError::from(e).into())
    }

    async fn create_analysis(&self, new: &NewAnalysis) -> Result<Analysis, StoreError> {
        let row = crate::create_analysis(&self.pool, new).await?;
        Ok(Analysis::try_from(row)?)
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, StoreError> {
        let row = crate::get_analysis(&self.pool, id).await?;
        Ok(row.map(Analysis::try_from).transpose()?)
    }

    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<AnalysisPage, StoreError> {
        let (rows, total) = crate::list_analyses(&self.pool, filter).await?;
        let items = rows
            .into_iter()
            .map(Analysis::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AnalysisPage { items, total })
    }

    async fn count_analyses_created_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        Ok(crate::count_analyses_created_between(&self.pool, owner_id, from, to).await?)
    }

    async fn list_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        Ok(crate::list_stale_pending(&self.pool, created_before, limit).await?)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: AnalysisStatus,
        to: AnalysisStatus,
    ) -> Result<bool, StoreError> {
        Ok(crate::transition_status(&self.pool, id, from, to).await?)
    }

    async fn list_competitors(
        &self,
        analysis_id: Uuid,
    ) -> Result<Vec<CompetitorListing>, StoreError> {
        let rows = crate::list_competitors(&self.pool, analysis_id).await?;
        Ok(rows.into_iter().map(CompetitorListing::from).collect())
    }

    async fn insert_competitors_if_absent(
        &self,
        analysis_id: Uuid,
        listings: &[NewCompetitorListing],
    ) -> Result<bool, StoreError> {
        Ok(crate::insert_competitors_if_absent(&self.pool, analysis_id, listings).await?)
    }

    async fn insert_generated_content(
        &self,
        analysis_id: Uuid,
        content: &NewGeneratedContent,
    ) -> Result<GeneratedContent, StoreError> {
        let row = crate::insert_generated_content(&self.pool, analysis_id, content).await?;
        Ok(row.into())
    }

    async fn latest_generated_content(
        &self,
        analysis_id: Uuid,
    ) -> Result<Option<GeneratedContent>, StoreError> {
        let row = crate::latest_generated_content(&self.pool, analysis_id).await?;
        Ok(row.map(GeneratedContent::from))
    }

    async fn upsert_keyword_metrics(
        &self,
        analysis_id: Uuid,
        metrics: &[KeywordMetric],
    ) -> Result<(), StoreError> {
        Ok(crate::upsert_keyword_metrics(&self.pool, analysis_id, metrics).await?)
    }

    async fn list_keyword_metrics(
        &self,
        analysis_id: Uuid,
    ) -> Result<Vec<KeywordMetric>, StoreError> {
        let rows = crate::list_keyword_metrics(&self.pool, analysis_id).await?;
        Ok(rows
            .into_iter()
            .map(KeywordMetric::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
