//! Analysis domain types shared by the store, engine, and API layers.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Minimum accepted length of a product name, in characters.
pub const MIN_PRODUCT_NAME_CHARS: usize = 2;

/// Marketplace an analysis targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Amazon,
    Flipkart,
    Meesho,
}

impl Marketplace {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Marketplace::Amazon => "amazon",
            Marketplace::Flipkart => "flipkart",
            Marketplace::Meesho => "meesho",
        }
    }

    /// Storefront domain used to scope competitor searches.
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            Marketplace::Amazon => "amazon.in",
            Marketplace::Flipkart => "flipkart.com",
            Marketplace::Meesho => "meesho.com",
        }
    }
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marketplace {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amazon" => Ok(Marketplace::Amazon),
            "flipkart" => Ok(Marketplace::Flipkart),
            "meesho" => Ok(Marketplace::Meesho),
            other => Err(CoreError::InvalidMarketplace(other.to_string())),
        }
    }
}

/// Lifecycle status of an analysis.
///
/// Moves strictly forward: `pending -> scanning -> completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Scanning,
    Completed,
    Failed,
}

impl AnalysisStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Scanning => "scanning",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Returns `true` if moving from `self` to `next` respects the forward-only lifecycle.
    #[must_use]
    pub fn can_transition_to(self, next: AnalysisStatus) -> bool {
        matches!(
            (self, next),
            (AnalysisStatus::Pending, AnalysisStatus::Scanning)
                | (
                    AnalysisStatus::Scanning,
                    AnalysisStatus::Completed | AnalysisStatus::Failed
                )
        )
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "scanning" => Ok(AnalysisStatus::Scanning),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// One user-submitted product-optimization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_features: Option<String>,
    pub category: Option<String>,
    pub marketplace: Marketplace,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    /// Set when the analysis reaches `completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a pending analysis.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub owner_id: Uuid,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_features: Option<String>,
    pub category: Option<String>,
    pub marketplace: Marketplace,
}

impl NewAnalysis {
    /// Validate creation input before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the product name is shorter than
    /// [`MIN_PRODUCT_NAME_CHARS`] after trimming.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.product_name.trim().chars().count() < MIN_PRODUCT_NAME_CHARS {
            return Err(CoreError::Validation(format!(
                "product_name must be at least {MIN_PRODUCT_NAME_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// A competitor listing produced by a competitor source, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompetitorListing {
    pub title: String,
    pub url: String,
    pub keywords: Vec<String>,
    pub price: Option<Decimal>,
    pub rating: Option<f32>,
}

/// A persisted competitor listing. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorListing {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub title: String,
    pub url: String,
    pub keywords: Vec<String>,
    /// 1-based position in the fetched result list.
    pub ranking_position: Option<i32>,
    pub price: Option<Decimal>,
    pub rating: Option<f32>,
    pub scraped_at: DateTime<Utc>,
}

/// Generated listing content, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGeneratedContent {
    pub optimized_title: String,
    pub optimized_description: String,
    pub recommended_keywords: Vec<String>,
    pub seo_score: i32,
    /// Prompt sent to the model; empty on the offline path.
    pub prompt: String,
    /// Raw model output; empty on the offline path.
    pub raw_response: String,
}

/// A persisted generation attempt. The newest row per analysis is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub optimized_title: String,
    pub optimized_description: String,
    pub recommended_keywords: Vec<String>,
    pub seo_score: i32,
    pub prompt: String,
    pub raw_response: String,
    pub created_at: DateTime<Utc>,
}

/// Qualitative trend classification of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendBadge {
    #[serde(rename = "Rising Fast")]
    RisingFast,
    #[serde(rename = "High & Rising")]
    HighAndRising,
    #[serde(rename = "Falling")]
    Falling,
    #[serde(rename = "High & Stable")]
    HighAndStable,
    #[serde(rename = "Stable")]
    Stable,
}

impl TrendBadge {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendBadge::RisingFast => "Rising Fast",
            TrendBadge::HighAndRising => "High & Rising",
            TrendBadge::Falling => "Falling",
            TrendBadge::HighAndStable => "High & Stable",
            TrendBadge::Stable => "Stable",
        }
    }

    /// Human-readable explanation shown beside the badge.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            TrendBadge::RisingFast => "High interest with strong positive momentum.",
            TrendBadge::HighAndRising => "High baseline and rising.",
            TrendBadge::Falling => "Declining momentum recently.",
            TrendBadge::HighAndStable => "High sustained interest.",
            TrendBadge::Stable => "Consistent demand.",
        }
    }
}

impl std::fmt::Display for TrendBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendBadge {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rising Fast" => Ok(TrendBadge::RisingFast),
            "High & Rising" => Ok(TrendBadge::HighAndRising),
            "Falling" => Ok(TrendBadge::Falling),
            "High & Stable" => Ok(TrendBadge::HighAndStable),
            "Stable" => Ok(TrendBadge::Stable),
            other => Err(CoreError::InvalidBadge(other.to_string())),
        }
    }
}

/// Whether a keyword should be used in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordRecommendation {
    Use,
    Monitor,
    Test,
    Avoid,
}

impl KeywordRecommendation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeywordRecommendation::Use => "Use",
            KeywordRecommendation::Monitor => "Monitor",
            KeywordRecommendation::Test => "Test",
            KeywordRecommendation::Avoid => "Avoid",
        }
    }
}

impl FromStr for KeywordRecommendation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Use" => Ok(KeywordRecommendation::Use),
            "Monitor" => Ok(KeywordRecommendation::Monitor),
            "Test" => Ok(KeywordRecommendation::Test),
            "Avoid" => Ok(KeywordRecommendation::Avoid),
            other => Err(CoreError::InvalidRecommendation(other.to_string())),
        }
    }
}

/// Trend-derived metrics for one recommended keyword, keyed by (analysis, keyword).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMetric {
    pub keyword: String,
    /// Mean normalized interest, 0..=100.
    pub avg_interest: i32,
    /// Last sample minus first sample, clamped to -100..=100.
    pub momentum: i32,
    /// Most recent samples, oldest first.
    pub samples: Vec<i32>,
    pub volume_estimate: i32,
    /// Always `None`: no paid CPC provider is wired in.
    pub cpc_estimate: Option<Decimal>,
    pub badge: TrendBadge,
    pub reason: String,
    pub recommendation: KeywordRecommendation,
}

/// Query over the analysis history.
#[derive(Debug, Clone, Default)]
pub struct AnalysisFilter {
    pub owner_id: Option<Uuid>,
    pub status: Option<AnalysisStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// One page of analyses plus the total matching the filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPage {
    pub items: Vec<Analysis>,
    pub total: i64,
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;
