//! Read-time SEO heuristics over persisted analysis data.
//!
//! Every function here is pure: identical inputs always give identical output.

use std::collections::{HashMap, HashSet};

use listingseo_core::{CompetitorListing, KeywordMetric, KeywordRecommendation, TrendBadge};
use serde::Serialize;

use crate::trends::TrendSummary;

/// Number of tags kept in [`TagSummary::top`].
pub const TOP_TAGS: usize = 20;
/// SEO score assumed when an analysis has no generated content yet.
pub const DEFAULT_SEO_SCORE: i32 = 70;
/// Floor for [`volume_estimate`].
pub const MIN_VOLUME_ESTIMATE: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub top: Vec<TagCount>,
    pub total_unique: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub keyword_density_percent: i32,
    pub readability: i32,
    pub competitive_strength: i32,
    pub expected_boost: i32,
    pub title_improvement_percent: i32,
}

/// Lowercased competitor keyword counts, most frequent first (ties keep
/// first-seen order), truncated to [`TOP_TAGS`].
#[must_use]
pub fn tag_frequencies(competitors: &[CompetitorListing]) -> TagSummary {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for keyword in competitors.iter().flat_map(|c| c.keywords.iter()) {
        let tag = keyword.to_lowercase();
        let count = counts.entry(tag.clone()).or_insert(0);
        if *count == 0 {
            order.push(tag);
        }
        *count += 1;
    }

    let mut ranked: Vec<TagCount> = order
        .into_iter()
        .map(|tag| {
            let count = counts.get(&tag).copied().unwrap_or_default();
            TagCount { tag, count }
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));

    let total_unique = ranked.len();
    ranked.truncate(TOP_TAGS);

    TagSummary {
        top: ranked,
        total_unique,
    }
}

/// Percent of recommended keywords found (case-insensitively) in the description.
#[must_use]
pub fn keyword_density_percent(recommended: &[String], description: &str) -> i32 {
    if recommended.is_empty() {
        return 0;
    }
    let description = description.to_lowercase();
    let present = recommended
        .iter()
        .filter(|kw| description.contains(&kw.to_lowercase()))
        .count();
    round_ratio_percent(present, recommended.len())
}

/// Gain in keyword coverage of the optimized title over the original product
/// name, 12 points per keyword, clamped to 0..=100.
#[must_use]
pub fn title_improvement_percent(
    recommended: &[String],
    optimized_title: &str,
    product_name: &str,
) -> i32 {
    let title = optimized_title.to_lowercase();
    let name = product_name.to_lowercase();
    let original_words: HashSet<&str> = name
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();

    let overlap = recommended
        .iter()
        .filter(|kw| title.contains(&kw.to_lowercase()))
        .count();
    let base_overlap = recommended
        .iter()
        .filter(|kw| original_words.contains(kw.to_lowercase().as_str()))
        .count();

    let delta = i64::try_from(overlap).unwrap_or(i64::MAX)
        - i64::try_from(base_overlap).unwrap_or(i64::MAX);
    clamp_to_i32(delta.saturating_mul(12), 0, 100)
}

/// Triangular heuristic peaking at a 600-character description, clamped to 40..=95.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn readability(description_chars: usize) -> i32 {
    let len = description_chars as f64;
    let score = 60.0 + (600.0 - (600.0 - len).abs()) / 40.0;
    round_clamped(score, 40, 95)
}

/// Based on competitor count (capped at 20) and tag diversity (capped at 40),
/// clamped to 10..=100.
#[must_use]
pub fn competitive_strength(competitor_count: usize, unique_tags: usize) -> i32 {
    let count = i64::try_from(competitor_count.min(20)).unwrap_or(20);
    let tags = i64::try_from(unique_tags.min(40)).unwrap_or(40);
    clamp_to_i32(30 + count * 2 + tags, 10, 100)
}

/// Expected ranking boost from SEO score and title improvement, clamped to 1..=60.
#[must_use]
pub fn expected_boost(seo_score: Option<i32>, title_improvement: i32) -> i32 {
    let seo = f64::from(seo_score.unwrap_or(DEFAULT_SEO_SCORE));
    let boost = (seo - 50.0) * 0.6 + f64::from(title_improvement) * 0.4;
    round_clamped(boost, 1, 60)
}

/// Recommended keywords that also appear among competitor keywords.
#[must_use]
pub fn keyword_overlap(recommended: &[String], competitors: &[CompetitorListing]) -> Vec<String> {
    let competitor_keywords: HashSet<String> = competitors
        .iter()
        .flat_map(|c| c.keywords.iter())
        .map(|k| k.to_lowercase())
        .collect();

    recommended
        .iter()
        .filter(|kw| competitor_keywords.contains(&kw.to_lowercase()))
        .cloned()
        .collect()
}

/// First matching rule wins.
#[must_use]
pub fn classify_trend(avg_interest: i32, momentum: i32) -> TrendBadge {
    if momentum >= 20 && avg_interest >= 40 {
        TrendBadge::RisingFast
    } else if momentum >= 5 && avg_interest >= 60 {
        TrendBadge::HighAndRising
    } else if momentum <= -20 {
        TrendBadge::Falling
    } else if avg_interest >= 70 {
        TrendBadge::HighAndStable
    } else {
        TrendBadge::Stable
    }
}

#[must_use]
pub fn recommend(avg_interest: i32, momentum: i32) -> KeywordRecommendation {
    match (avg_interest >= 50, momentum) {
        (true, m) if m >= 0 => KeywordRecommendation::Use,
        (true, _) => KeywordRecommendation::Monitor,
        (false, m) if m > 10 => KeywordRecommendation::Test,
        (false, _) => KeywordRecommendation::Avoid,
    }
}

#[must_use]
pub fn volume_estimate(avg_interest: i32) -> i32 {
    avg_interest.saturating_mul(120).max(MIN_VOLUME_ESTIMATE)
}

/// Full keyword metric for a trend summary.
#[must_use]
pub fn keyword_metric(summary: &TrendSummary) -> KeywordMetric {
    let badge = classify_trend(summary.avg_interest, summary.momentum);
    KeywordMetric {
        keyword: summary.keyword.clone(),
        avg_interest: summary.avg_interest,
        momentum: summary.momentum,
        samples: summary.samples.clone(),
        volume_estimate: volume_estimate(summary.avg_interest),
        cpc_estimate: None,
        badge,
        reason: badge.reason().to_string(),
        recommendation: recommend(summary.avg_interest, summary.momentum),
    }
}

#[allow(clippy::cast_precision_loss)]
fn round_ratio_percent(part: usize, whole: usize) -> i32 {
    round_clamped(100.0 * part as f64 / whole as f64, 0, 100)
}

#[allow(clippy::cast_possible_truncation)]
fn round_clamped(value: f64, min: i32, max: i32) -> i32 {
    value.round().clamp(f64::from(min), f64::from(max)) as i32
}

fn clamp_to_i32(value: i64, min: i32, max: i32) -> i32 {
    i32::try_from(value.clamp(i64::from(min), i64::from(max))).unwrap_or(min)
}

#[cfg(test)]
#[path = "scoring_test.rs"]
mod tests;
