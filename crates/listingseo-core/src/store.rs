//! Persistence contract consumed by the workflow, the report builder, and the API.
//!
//! The Postgres implementation lives in `listingseo-db`; an in-memory
//! implementation lives in `listingseo-engine` for offline runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::{
    Analysis, AnalysisFilter, AnalysisPage, AnalysisStatus, CompetitorListing, GeneratedContent,
    KeywordMetric, NewAnalysis, NewCompetitorListing, NewGeneratedContent,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Reject status pairs outside the `pending -> scanning -> completed | failed`
/// lifecycle. Store implementations call this before touching any row.
///
/// # Errors
///
/// Returns [`StoreError::IllegalTransition`] when `from` cannot move to `to`.
pub fn check_transition(from: AnalysisStatus, to: AnalysisStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::IllegalTransition { from, to })
    }
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a new analysis in `pending` status.
    async fn create_analysis(&self, new: &NewAnalysis) -> Result<Analysis, StoreError>;

    async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, StoreError>;

    /// Newest first, with the total count matching the filter.
    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<AnalysisPage, StoreError>;

    /// Count analyses an owner created in `[from, to)`.
    async fn count_analyses_created_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Ids of analyses still `pending` that were created before `created_before`,
    /// oldest first.
    async fn list_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError>;

    /// Move an analysis from `from` to `to` if it is currently in `from`.
    ///
    /// Sets `completed_at` when `to` is `completed`. Returns `false` when the
    /// analysis was not in `from` (or does not exist); nothing is written then.
    /// Pairs rejected by [`check_transition`] fail with
    /// [`StoreError::IllegalTransition`].
    async fn transition_status(
        &self,
        id: Uuid,
        from: AnalysisStatus,
        to: AnalysisStatus,
    ) -> Result<bool, StoreError>;

    /// All competitor listings for an analysis, ordered by ranking position.
    async fn list_competitors(&self, analysis_id: Uuid)
        -> Result<Vec<CompetitorListing>, StoreError>;

    /// Insert `listings` only if the analysis has no competitor rows yet.
    ///
    /// The check and the insert are atomic with respect to other callers for
    /// the same analysis. Returns `true` if the rows were written.
    async fn insert_competitors_if_absent(
        &self,
        analysis_id: Uuid,
        listings: &[NewCompetitorListing],
    ) -> Result<bool, StoreError>;

    async fn insert_generated_content(
        &self,
        analysis_id: Uuid,
        content: &NewGeneratedContent,
    ) -> Result<GeneratedContent, StoreError>;

    /// Most recent generation attempt by creation time.
    async fn latest_generated_content(
        &self,
        analysis_id: Uuid,
    ) -> Result<Option<GeneratedContent>, StoreError>;

    /// Insert or overwrite metrics keyed by `(analysis_id, keyword)`.
    async fn upsert_keyword_metrics(
        &self,
        analysis_id: Uuid,
        metrics: &[KeywordMetric],
    ) -> Result<(), StoreError>;

    /// Persisted metrics for an analysis, highest interest first.
    async fn list_keyword_metrics(&self, analysis_id: Uuid)
        -> Result<Vec<KeywordMetric>, StoreError>;
}
