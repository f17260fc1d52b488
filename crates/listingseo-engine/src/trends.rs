//! Keyword interest and momentum from a trends time series.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::cache::BoundedCache;
use crate::providers::TrendsSource;

pub const MAX_TREND_KEYWORDS: usize = 20;
pub const TREND_BATCH_SIZE: usize = 5;
/// Only the most recent samples are kept.
pub const MAX_TREND_SAMPLES: usize = 12;

/// Summary of one keyword's interest series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub keyword: String,
    /// Rounded mean of the series, 0..=100.
    pub avg_interest: i32,
    /// Last sample minus first, clamped to -100..=100.
    pub momentum: i32,
    pub samples: Vec<i32>,
}

/// Cache key: `(geo, lowercased keyword)`.
pub type TrendsCache = BoundedCache<(String, String), TrendSummary>;

#[derive(Clone)]
pub struct TrendsService {
    source: Option<Arc<dyn TrendsSource>>,
    cache: Arc<TrendsCache>,
    timeout: Duration,
}

impl TrendsService {
    #[must_use]
    pub fn new(
        source: Option<Arc<dyn TrendsSource>>,
        cache: Arc<TrendsCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            timeout,
        }
    }

    /// Trend summaries for up to [`MAX_TREND_KEYWORDS`] distinct keywords,
    /// sorted by average interest then momentum, both descending.
    ///
    /// Keywords are looked up [`TREND_BATCH_SIZE`] at a time; a batch starts
    /// only after the previous one has settled. Keywords with no data (no
    /// source configured, timeout, error, empty series) are left out.
    pub async fn get_metrics(&self, keywords: &[String], geo: &str) -> Vec<TrendSummary> {
        let Some(source) = &self.source else {
            return Vec::new();
        };

        let unique = normalize_keywords(keywords);
        let mut out = Vec::with_capacity(unique.len());

        for batch in unique.chunks(TREND_BATCH_SIZE) {
            let lookups = batch.iter().map(|keyword| self.lookup(source, keyword, geo));
            out.extend(join_all(lookups).await.into_iter().flatten());
        }

        out.sort_by(|a, b| {
            b.avg_interest
                .cmp(&a.avg_interest)
                .then_with(|| b.momentum.cmp(&a.momentum))
        });
        out
    }

    async fn lookup(
        &self,
        source: &Arc<dyn TrendsSource>,
        keyword: &str,
        geo: &str,
    ) -> Option<TrendSummary> {
        let key = (geo.to_string(), keyword.to_string());
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(keyword, geo, "trends cache hit");
            return Some(hit);
        }

        let series = match tokio::time::timeout(
            self.timeout,
            source.interest_over_time(keyword, geo),
        )
        .await
        {
            Ok(Ok(series)) => series,
            Ok(Err(e)) => {
                tracing::warn!(keyword, geo, error = %e, "trends lookup failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(keyword, geo, "trends lookup timed out");
                return None;
            }
        };

        let summary = summarize(keyword, &series)?;
        self.cache.insert(key, summary.clone()).await;
        Some(summary)
    }
}

/// Trim, lowercase, drop blanks and duplicates, cap at [`MAX_TREND_KEYWORDS`].
fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .take(MAX_TREND_KEYWORDS)
        .collect()
}

/// Reduce a series to average, momentum and the recent tail.
/// Returns `None` for an empty series.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn summarize(keyword: &str, series: &[f64]) -> Option<TrendSummary> {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    let (first, last) = (*values.first()?, *values.last()?);

    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let momentum = (last - first).round().clamp(-100.0, 100.0);
    let tail_start = values.len().saturating_sub(MAX_TREND_SAMPLES);

    Some(TrendSummary {
        keyword: keyword.to_string(),
        avg_interest: avg.round().clamp(0.0, 100.0) as i32,
        momentum: momentum as i32,
        samples: values[tail_start..]
            .iter()
            .map(|v| v.round().clamp(0.0, 100.0) as i32)
            .collect(),
    })
}

#[cfg(test)]
#[path = "trends_test.rs"]
mod tests;
