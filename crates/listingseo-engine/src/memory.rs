//! In-memory [`AnalysisStore`] used for offline runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listingseo_core::{
    check_transition, Analysis, AnalysisFilter, AnalysisPage, AnalysisStatus, AnalysisStore,
    CompetitorListing, GeneratedContent, KeywordMetric, NewAnalysis, NewCompetitorListing,
    NewGeneratedContent, StoreError,
};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    analyses: HashMap<Uuid, Analysis>,
    competitors: HashMap<Uuid, Vec<CompetitorListing>>,
    content: Vec<GeneratedContent>,
    metrics: HashMap<Uuid, Vec<KeywordMetric>>,
}

/// A process-local store. A single lock guards all tables, so each trait
/// method is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn content_rows(&self, analysis_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .content
            .iter()
            .filter(|c| c.analysis_id == analysis_id)
            .count()
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_analysis(&self, new: &NewAnalysis) -> Result<Analysis, StoreError> {
        let analysis = Analysis {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            product_name: new.product_name.trim().to_string(),
            product_description: new.product_description.clone(),
            product_features: new.product_features.clone(),
            category: new.category.clone(),
            marketplace: new.marketplace,
            status: AnalysisStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.state
            .lock()
            .await
            .analyses
            .insert(analysis.id, analysis.clone());
        Ok(analysis)
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, StoreError> {
        Ok(self.state.lock().await.analyses.get(&id).cloned())
    }

    async fn list_analyses(&self, filter: &AnalysisFilter) -> Result<AnalysisPage, StoreError> {
        let state = self.state.lock().await;
        let mut matching: Vec<Analysis> = state
            .analyses
            .values()
            .filter(|a| filter.owner_id.is_none_or(|owner| a.owner_id == owner))
            .filter(|a| filter.status.is_none_or(|status| a.status == status))
            .cloned()
            .collect();
        drop(state);

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        let items = matching.into_iter().skip(offset).take(limit).collect();

        Ok(AnalysisPage { items, total })
    }

    async fn count_analyses_created_between(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        let count = state
            .analyses
            .values()
            .filter(|a| a.owner_id == owner_id && a.created_at >= from && a.created_at < to)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn list_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.lock().await;
        let mut stale: Vec<&Analysis> = state
            .analyses
            .values()
            .filter(|a| a.status == AnalysisStatus::Pending && a.created_at < created_before)
            .collect();
        stale.sort_by_key(|a| a.created_at);

        Ok(stale
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|a| a.id)
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: AnalysisStatus,
        to: AnalysisStatus,
    ) -> Result<bool, StoreError> {
        check_transition(from, to)?;
        let mut state = self.state.lock().await;
        match state.analyses.get_mut(&id) {
            Some(analysis) if analysis.status == from => {
                analysis.status = to;
                if to == AnalysisStatus::Completed {
                    analysis.completed_at = Some(Utc::now());
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_competitors(
        &self,
        analysis_id: Uuid,
    ) -> Result<Vec<CompetitorListing>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .competitors
            .get(&analysis_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_competitors_if_absent(
        &self,
        analysis_id: Uuid,
        listings: &[NewCompetitorListing],
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .competitors
            .get(&analysis_id)
            .is_some_and(|rows| !rows.is_empty())
        {
            return Ok(false);
        }

        let scraped_at = Utc::now();
        let rows = listings
            .iter()
            .enumerate()
            .map(|(index, listing)| CompetitorListing {
                id: Uuid::new_v4(),
                analysis_id,
                title: listing.title.clone(),
                url: listing.url.clone(),
                keywords: listing.keywords.clone(),
                ranking_position: i32::try_from(index + 1).ok(),
                price: listing.price,
                rating: listing.rating,
                scraped_at,
            })
            .collect();
        state.competitors.insert(analysis_id, rows);
        Ok(true)
    }

    async fn insert_generated_content(
        &self,
        analysis_id: Uuid,
        content: &NewGeneratedContent,
    ) -> Result<GeneratedContent, StoreError> {
        let row = GeneratedContent {
            id: Uuid::new_v4(),
            analysis_id,
            optimized_title: content.optimized_title.clone(),
            optimized_description: content.optimized_description.clone(),
            recommended_keywords: content.recommended_keywords.clone(),
            seo_score: content.seo_score,
            prompt: content.prompt.clone(),
            raw_response: content.raw_response.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().await.content.push(row.clone());
        Ok(row)
    }

    async fn latest_generated_content(
        &self,
        analysis_id: Uuid,
    ) -> Result<Option<GeneratedContent>, StoreError> {
        let state = self.state.lock().await;
        // `max_by_key` returns the last of equal maxima, i.e. the latest insert.
        Ok(state
            .content
            .iter()
            .filter(|c| c.analysis_id == analysis_id)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn upsert_keyword_metrics(
        &self,
        analysis_id: Uuid,
        metrics: &[KeywordMetric],
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let rows = state.metrics.entry(analysis_id).or_default();
        for metric in metrics {
            match rows.iter_mut().find(|row| row.keyword == metric.keyword) {
                Some(existing) => *existing = metric.clone(),
                None => rows.push(metric.clone()),
            }
        }
        Ok(())
    }

    async fn list_keyword_metrics(
        &self,
        analysis_id: Uuid,
    ) -> Result<Vec<KeywordMetric>, StoreError> {
        let mut rows = self
            .state
            .lock()
            .await
            .metrics
            .get(&analysis_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            b.avg_interest
                .cmp(&a.avg_interest)
                .then(b.momentum.cmp(&a.momentum))
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        Ok(rows)
    }
}
