//! Wiring of providers, caches and services from configuration.

use std::sync::Arc;
use std::time::Duration;

use listingseo_core::{AnalysisStore, AppConfig};

use crate::cache::BoundedCache;
use crate::competitors::CompetitorSource;
use crate::content::ContentGenerator;
use crate::error::ProviderError;
use crate::providers::{GeminiClient, SearchProvider, SerpApiClient, TextGenerator, TrendsSource};
use crate::trends::TrendsService;
use crate::workflow::AnalysisWorkflow;

/// Long-lived services shared by the workflow and the report builder.
///
/// Caches live here so every workflow run and report read in the process
/// shares them.
#[derive(Clone)]
pub struct EngineServices {
    pub competitors: CompetitorSource,
    pub content: ContentGenerator,
    pub trends: TrendsService,
    pub trends_geo: String,
}

impl EngineServices {
    /// Build live clients for every configured API key; services without a key
    /// run on their fallbacks.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if an HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let serpapi = config
            .serpapi_key
            .as_deref()
            .map(|key| SerpApiClient::new(key, config.provider_timeout_secs))
            .transpose()?
            .map(Arc::new);
        let gemini = config
            .gemini_api_key
            .as_deref()
            .map(|key| {
                GeminiClient::new(key, &config.gemini_model, config.provider_timeout_secs)
            })
            .transpose()?
            .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);

        tracing::info!(
            search = serpapi.is_some(),
            trends = serpapi.is_some(),
            generator = gemini.is_some(),
            "engine providers configured"
        );

        Ok(Self::with_providers(
            serpapi.clone().map(|c| c as Arc<dyn SearchProvider>),
            serpapi.map(|c| c as Arc<dyn TrendsSource>),
            gemini,
            Settings {
                timeout: Duration::from_secs(config.provider_timeout_secs),
                cache_max_entries: config.cache_max_entries,
                cache_ttl: Duration::from_secs(config.cache_ttl_secs),
                trends_geo: config.trends_geo.clone(),
            },
        ))
    }

    /// No providers at all: synthetic competitors, template content and no
    /// trend data.
    #[must_use]
    pub fn offline(trends_geo: &str) -> Self {
        Self::with_providers(None, None, None, Settings::offline(trends_geo))
    }

    #[must_use]
    pub fn with_providers(
        search: Option<Arc<dyn SearchProvider>>,
        trends: Option<Arc<dyn TrendsSource>>,
        generator: Option<Arc<dyn TextGenerator>>,
        settings: Settings,
    ) -> Self {
        let competitor_cache = Arc::new(BoundedCache::new(
            settings.cache_max_entries,
            settings.cache_ttl,
        ));
        let trends_cache = Arc::new(BoundedCache::new(
            settings.cache_max_entries,
            settings.cache_ttl,
        ));

        Self {
            competitors: CompetitorSource::new(search, competitor_cache, settings.timeout),
            content: ContentGenerator::new(generator, settings.timeout),
            trends: TrendsService::new(trends, trends_cache, settings.timeout),
            trends_geo: settings.trends_geo,
        }
    }

    /// A workflow bound to `store` that shares these services' caches.
    #[must_use]
    pub fn workflow(&self, store: Arc<dyn AnalysisStore>) -> AnalysisWorkflow {
        AnalysisWorkflow::new(store, self.competitors.clone(), self.content.clone())
    }
}

/// Timeouts and cache sizing for [`EngineServices::with_providers`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub timeout: Duration,
    pub cache_max_entries: usize,
    pub cache_ttl: Duration,
    pub trends_geo: String,
}

impl Settings {
    #[must_use]
    pub fn offline(trends_geo: &str) -> Self {
        Self {
            timeout: Duration::from_secs(7),
            cache_max_entries: 1000,
            cache_ttl: Duration::from_secs(6 * 60 * 60),
            trends_geo: trends_geo.to_string(),
        }
    }
}
