//! Read-time aggregation of one analysis into the report served to clients.
//!
//! Everything here is recomputed on every read from persisted rows. The only
//! side effect is the keyword metrics refresh, whose failures are logged and
//! swallowed.

use listingseo_core::{
    Analysis, AnalysisStore, CompetitorListing, GeneratedContent, KeywordMetric, StoreError,
};
use serde::Serialize;
use uuid::Uuid;

use crate::scoring::{
    competitive_strength, expected_boost, keyword_density_percent, keyword_metric,
    keyword_overlap, readability, tag_frequencies, title_improvement_percent, DerivedMetrics,
    TagSummary,
};
use crate::trends::TrendsService;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis: Analysis,
    /// Latest generated content, if the workflow produced any.
    pub content: Option<GeneratedContent>,
    pub competitors: Vec<CompetitorListing>,
    pub metrics: DerivedMetrics,
    pub tags: TagSummary,
    pub keyword_overlap: Vec<String>,
    pub keyword_metrics: Vec<KeywordMetric>,
}

/// Build the report for `id`, or `None` if the analysis does not exist.
///
/// # Errors
///
/// Returns [`StoreError`] if loading the analysis, its content, or its
/// competitors fails.
pub async fn build_report(
    store: &dyn AnalysisStore,
    trends: &TrendsService,
    geo: &str,
    id: Uuid,
) -> Result<Option<AnalysisReport>, StoreError> {
    let Some(analysis) = store.get_analysis(id).await? else {
        return Ok(None);
    };
    let content = store.latest_generated_content(id).await?;
    let competitors = store.list_competitors(id).await?;

    let (recommended, description, title, seo_score) = match &content {
        Some(c) => (
            c.recommended_keywords.as_slice(),
            c.optimized_description.as_str(),
            c.optimized_title.as_str(),
            Some(c.seo_score),
        ),
        None => (&[][..], "", analysis.product_name.as_str(), None),
    };

    let tags = tag_frequencies(&competitors);
    let title_improvement =
        title_improvement_percent(recommended, title, &analysis.product_name);
    let metrics = DerivedMetrics {
        keyword_density_percent: keyword_density_percent(recommended, description),
        readability: readability(description.chars().count()),
        competitive_strength: competitive_strength(competitors.len(), tags.total_unique),
        expected_boost: expected_boost(seo_score, title_improvement),
        title_improvement_percent: title_improvement,
    };
    let overlap = keyword_overlap(recommended, &competitors);
    let keyword_metrics = refresh_keyword_metrics(store, trends, geo, id, recommended).await;

    Ok(Some(AnalysisReport {
        analysis,
        content,
        competitors,
        metrics,
        tags,
        keyword_overlap: overlap,
        keyword_metrics,
    }))
}

/// Fresh trend metrics for the recommended keywords, upserted for the
/// analysis. Falls back to the persisted rows when no fresh data is available.
async fn refresh_keyword_metrics(
    store: &dyn AnalysisStore,
    trends: &TrendsService,
    geo: &str,
    id: Uuid,
    recommended: &[String],
) -> Vec<KeywordMetric> {
    let fresh: Vec<KeywordMetric> = if recommended.is_empty() {
        Vec::new()
    } else {
        trends
            .get_metrics(recommended, geo)
            .await
            .iter()
            .map(keyword_metric)
            .collect()
    };

    if fresh.is_empty() {
        return match store.list_keyword_metrics(id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(analysis_id = %id, error = %e, "could not load keyword metrics");
                Vec::new()
            }
        };
    }

    if let Err(e) = store.upsert_keyword_metrics(id, &fresh).await {
        tracing::warn!(analysis_id = %id, error = %e, "keyword metrics upsert failed");
    }
    fresh
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
