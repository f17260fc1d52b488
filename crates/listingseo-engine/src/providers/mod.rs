//! Outbound provider contracts and their HTTP implementations.
//!
//! Services hold these as optional trait objects: `None` means no API key is
//! configured and the service takes its fallback path without calling out.

mod gemini;
mod serpapi;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use gemini::GeminiClient;
pub use serpapi::SerpApiClient;

/// One organic search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub price: Option<f64>,
    pub rating: Option<f32>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `"<query>" site:<domain>` and return at most `limit` organic results.
    async fn search_site(
        &self,
        query: &str,
        domain: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError>;
}

#[async_trait]
pub trait TrendsSource: Send + Sync {
    /// Normalized interest series for `keyword` in `geo`, oldest first.
    async fn interest_over_time(&self, keyword: &str, geo: &str)
        -> Result<Vec<f64>, ProviderError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a single prompt and return the model's free-text answer.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
