pub mod analysis;
pub mod app_config;
pub mod config;
pub mod store;

pub use analysis::{
    Analysis, AnalysisFilter, AnalysisPage, AnalysisStatus, CompetitorListing, GeneratedContent,
    KeywordMetric, KeywordRecommendation, Marketplace, NewAnalysis, NewCompetitorListing,
    NewGeneratedContent, TrendBadge, MIN_PRODUCT_NAME_CHARS,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use store::{check_transition, AnalysisStore, StoreError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid marketplace: {0}")]
    InvalidMarketplace(String),

    #[error("invalid analysis status: {0}")]
    InvalidStatus(String),

    #[error("invalid trend badge: {0}")]
    InvalidBadge(String),

    #[error("invalid keyword recommendation: {0}")]
    InvalidRecommendation(String),

    #[error("validation failed: {0}")]
    Validation(String),
}
