//! Gemini `generateContent` REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const PROVIDER: &str = "gemini";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ProviderError::InvalidBaseUrl`] if the endpoint does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("listingseo/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(&format!("v1beta/models/{model}:generateContent")))
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
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message: "response contained no text".to_string(),
            });
        }

        Ok(text)
    }
}
