//! Analysis workflow: drives one analysis from `pending` to a terminal status.

use std::sync::Arc;

use listingseo_core::{Analysis, AnalysisStatus, AnalysisStore};
use uuid::Uuid;

use crate::competitors::{dedupe_listings, CompetitorSource, MAX_COMPETITORS};
use crate::content::{ContentGenerator, ContentRequest};
use crate::error::WorkflowError;

/// Result of a workflow run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed {
        content_id: Uuid,
        competitor_count: usize,
    },
    /// The analysis was owned by another run or already terminal; nothing
    /// was written.
    Skipped { status: AnalysisStatus },
}

#[derive(Clone)]
pub struct AnalysisWorkflow {
    store: Arc<dyn AnalysisStore>,
    competitors: CompetitorSource,
    content: ContentGenerator,
}

impl AnalysisWorkflow {
    #[must_use]
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        competitors: CompetitorSource,
        content: ContentGenerator,
    ) -> Self {
        Self {
            store,
            competitors,
            content,
        }
    }

    /// Process one analysis.
    ///
    /// 1. Claim it with a `pending -> scanning` compare-and-set. A run that
    ///    loses the claim (another run owns it, or it is terminal) is skipped.
    /// 2. Reuse persisted competitor rows, or fetch, dedupe and persist them
    ///    once.
    /// 3. Generate content from competitor titles and keywords and persist it.
    /// 4. Move to `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if the analysis does not exist, and
    /// [`WorkflowError::Store`] on persistence failures. Once claimed, any
    /// error leaves the analysis `failed`.
    pub async fn process(&self, id: Uuid) -> Result<WorkflowOutcome, WorkflowError> {
        self.run(id, false).await
    }

    /// Like [`process`](Self::process), but also takes over an analysis left
    /// `scanning` by an interrupted run. Only for operator-driven reruns; the
    /// caller must know no other run is active.
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process).
    pub async fn resume(&self, id: Uuid) -> Result<WorkflowOutcome, WorkflowError> {
        self.run(id, true).await
    }

    async fn run(&self, id: Uuid, resume: bool) -> Result<WorkflowOutcome, WorkflowError> {
        let claimed = self
            .store
            .transition_status(id, AnalysisStatus::Pending, AnalysisStatus::Scanning)
            .await?;

        let analysis = match self.store.get_analysis(id).await {
            Ok(Some(analysis)) => analysis,
            Ok(None) => return Err(WorkflowError::NotFound(id)),
            Err(e) => {
                if claimed {
                    self.mark_failed(id).await;
                }
                return Err(e.into());
            }
        };

        let resumed = !claimed && resume && analysis.status == AnalysisStatus::Scanning;
        if !claimed && !resumed {
            tracing::info!(analysis_id = %id, status = %analysis.status, "analysis not claimable; skipping");
            return Ok(WorkflowOutcome::Skipped {
                status: analysis.status,
            });
        }

        tracing::info!(
            analysis_id = %id,
            marketplace = %analysis.marketplace,
            resumed,
            "scanning analysis"
        );

        match self.scan(&analysis).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(analysis_id = %id, error = %e, "analysis failed");
                self.mark_failed(id).await;
                Err(e)
            }
        }
    }

    async fn scan(&self, analysis: &Analysis) -> Result<WorkflowOutcome, WorkflowError> {
        let id = analysis.id;

        let mut competitors = self.store.list_competitors(id).await?;
        if competitors.is_empty() {
            let fetched = self
                .competitors
                .fetch(&analysis.product_name, analysis.marketplace)
                .await;
            let listings = dedupe_listings(fetched, MAX_COMPETITORS);
            let inserted = self
                .store
                .insert_competitors_if_absent(id, &listings)
                .await?;
            if !inserted {
                tracing::debug!(analysis_id = %id, "competitor rows written concurrently; reusing them");
            }
            competitors = self.store.list_competitors(id).await?;
        } else {
            tracing::debug!(
                analysis_id = %id,
                count = competitors.len(),
                "reusing persisted competitor rows"
            );
        }

        let titles: Vec<String> = competitors.iter().map(|c| c.title.clone()).collect();
        let keywords: Vec<String> = competitors
            .iter()
            .flat_map(|c| c.keywords.iter().cloned())
            .collect();

        let request = ContentRequest {
            product_name: &analysis.product_name,
            product_description: analysis.product_description.as_deref().unwrap_or_default(),
            competitor_titles: &titles,
            keywords: &keywords,
            marketplace: analysis.marketplace,
        };
        let content = self.content.generate(&request).await;
        let stored = self.store.insert_generated_content(id, &content).await?;

        let completed = self
            .store
            .transition_status(id, AnalysisStatus::Scanning, AnalysisStatus::Completed)
            .await?;
        if !completed {
            return Err(WorkflowError::StatusConflict(id));
        }

        tracing::info!(
            analysis_id = %id,
            competitors = competitors.len(),
            seo_score = stored.seo_score,
            "analysis completed"
        );

        Ok(WorkflowOutcome::Completed {
            content_id: stored.id,
            competitor_count: competitors.len(),
        })
    }

    async fn mark_failed(&self, id: Uuid) {
        match self
            .store
            .transition_status(id, AnalysisStatus::Scanning, AnalysisStatus::Failed)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(analysis_id = %id, "analysis left scanning before it could be failed");
            }
            Err(e) => {
                tracing::error!(analysis_id = %id, error = %e, "could not mark analysis failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "workflow_test.rs"]
mod tests;
