//! SerpAPI client covering the Google search and Google Trends engines.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{SearchHit, SearchProvider, TrendsSource};
use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://serpapi.com/";
const PROVIDER: &str = "serpapi";

/// Client for `search.json`. Use [`SerpApiClient::with_base_url`] to point at
/// a mock server in tests.
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    rich_snippet: Option<RichSnippet>,
}

#[derive(Debug, Deserialize)]
struct RichSnippet {
    #[serde(default)]
    bottom: Option<RichSnippetSection>,
}

#[derive(Debug, Deserialize)]
struct RichSnippetSection {
    #[serde(default)]
    detected_extensions: Option<DetectedExtensions>,
}

#[derive(Debug, Deserialize)]
struct DetectedExtensions {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    rating: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    interest_over_time: Option<InterestOverTime>,
}

#[derive(Debug, Deserialize)]
struct InterestOverTime {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    values: Vec<TimelineValue>,
}

#[derive(Debug, Deserialize)]
struct TimelineValue {
    #[serde(default)]
    extracted_value: Option<f64>,
    #[serde(default)]
    value: Option<String>,
}

impl TimelinePoint {
    /// First series value; `extracted_value` wins over the display string.
    fn first_value(&self) -> Option<f64> {
        let first = self.values.first()?;
        first
            .extracted_value
            .or_else(|| first.value.as_deref().and_then(|v| v.trim().parse().ok()))
            .filter(|v: &f64| v.is_finite())
    }
}

impl SerpApiClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("listingseo/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("search.json"))
            .map_err(|e| ProviderError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
        })
    }

    async fn get_json<T>(&self, params: &[(&str, &str)]) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search_site(
        &self,
        query: &str,
        domain: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let q = format!("\"{query}\" site:{domain}");
        let num = limit.to_string();
        let body: SearchResponse = self
            .get_json(&[("engine", "google"), ("q", q.as_str()), ("num", num.as_str())])
            .await?;

        if let Some(message) = body.error {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message,
            });
        }

        let hits = body
            .organic_results
            .into_iter()
            .filter(|r| !r.title.trim().is_empty())
            .take(limit)
            .map(|r| {
                let extensions = r
                    .rich_snippet
                    .and_then(|s| s.bottom)
                    .and_then(|b| b.detected_extensions);
                SearchHit {
                    title: r.title.trim().to_string(),
                    link: r.link,
                    price: extensions.as_ref().and_then(|e| e.price),
                    rating: extensions.as_ref().and_then(|e| e.rating),
                }
            })
            .collect();

        Ok(hits)
    }
}

#[async_trait]
impl TrendsSource for SerpApiClient {
    async fn interest_over_time(
        &self,
        keyword: &str,
        geo: &str,
    ) -> Result<Vec<f64>, ProviderError> {
        let body: TrendsResponse = self
            .get_json(&[
                ("engine", "google_trends"),
                ("q", keyword),
                ("data_type", "TIMESERIES"),
                ("geo", geo),
            ])
            .await?;

        if let Some(message) = body.error {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message,
            });
        }

        Ok(body
            .interest_over_time
            .map(|iot| {
                iot.timeline_data
                    .iter()
                    .filter_map(TimelinePoint::first_value)
                    .collect()
            })
            .unwrap_or_default())
    }
}
