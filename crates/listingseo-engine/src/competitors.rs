//! Competitor listing source: live site-scoped search with a synthetic fallback.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use listingseo_core::{Marketplace, NewCompetitorListing};
use rust_decimal::Decimal;

use crate::cache::BoundedCache;
use crate::keywords::{extract_keywords, DEFAULT_KEYWORD_LIMIT};
use crate::providers::{SearchHit, SearchProvider};

/// Upper bound on listings fetched and persisted per analysis.
pub const MAX_COMPETITORS: usize = 20;

/// Suffixes appended to the product name when no live results are available.
pub const SYNTHETIC_SUFFIXES: [&str; 5] =
    ["original", "premium", "best price", "latest model", "top rated"];

/// Cache key: `(marketplace domain, lowercased product name)`.
pub type CompetitorCache = BoundedCache<(String, String), Vec<NewCompetitorListing>>;

#[derive(Clone)]
pub struct CompetitorSource {
    search: Option<Arc<dyn SearchProvider>>,
    cache: Arc<CompetitorCache>,
    timeout: Duration,
}

impl CompetitorSource {
    #[must_use]
    pub fn new(
        search: Option<Arc<dyn SearchProvider>>,
        cache: Arc<CompetitorCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            search,
            cache,
            timeout,
        }
    }

    /// Competitor listings for `product_name` on `marketplace`.
    ///
    /// Never fails: any search error, timeout, or empty result degrades to
    /// [`synthetic_listings`]. The final list is cached either way.
    pub async fn fetch(
        &self,
        product_name: &str,
        marketplace: Marketplace,
    ) -> Vec<NewCompetitorListing> {
        let domain = marketplace.domain();
        let key = (domain.to_string(), product_name.trim().to_lowercase());

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(domain, product = product_name, "competitor cache hit");
            return cached;
        }

        let mut listings = self.search_live(product_name, domain).await;
        if listings.is_empty() {
            listings = synthetic_listings(product_name, domain);
        }

        self.cache.insert(key, listings.clone()).await;
        listings
    }

    async fn search_live(&self, product_name: &str, domain: &str) -> Vec<NewCompetitorListing> {
        let Some(search) = &self.search else {
            return Vec::new();
        };

        let call = search.search_site(product_name.trim(), domain, MAX_COMPETITORS);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(hits)) => hits
                .into_iter()
                .take(MAX_COMPETITORS)
                .map(listing_from_hit)
                .collect(),
            Ok(Err(e)) => {
                tracing::warn!(domain, error = %e, "competitor search failed; using fallback");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    domain,
                    timeout_secs = self.timeout.as_secs(),
                    "competitor search timed out; using fallback"
                );
                Vec::new()
            }
        }
    }
}

fn listing_from_hit(hit: SearchHit) -> NewCompetitorListing {
    NewCompetitorListing {
        keywords: extract_keywords(&hit.title, DEFAULT_KEYWORD_LIMIT),
        price: hit
            .price
            .and_then(|p| Decimal::try_from(p).ok())
            .map(|p| p.round_dp(2)),
        rating: hit.rating.filter(|r| r.is_finite()),
        title: hit.title,
        url: hit.link,
    }
}

/// Five deterministic listings built from [`SYNTHETIC_SUFFIXES`].
#[must_use]
pub fn synthetic_listings(product_name: &str, domain: &str) -> Vec<NewCompetitorListing> {
    let name = product_name.trim();
    SYNTHETIC_SUFFIXES
        .iter()
        .map(|suffix| {
            let title = format!("{name} {suffix}");
            NewCompetitorListing {
                url: format!("https://www.{domain}/s?k={}", slug(&title)),
                keywords: extract_keywords(&title, DEFAULT_KEYWORD_LIMIT),
                title,
                price: None,
                rating: None,
            }
        })
        .collect()
}

/// Drop listings repeating an earlier URL (or title, when the URL is blank),
/// compared case-insensitively, and cap at `limit`.
#[must_use]
pub fn dedupe_listings(
    listings: Vec<NewCompetitorListing>,
    limit: usize,
) -> Vec<NewCompetitorListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| {
            let key = if listing.url.trim().is_empty() {
                listing.title.trim().to_lowercase()
            } else {
                listing.url.trim().to_lowercase()
            };
            seen.insert(key)
        })
        .take(limit)
        .collect()
}

fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
#[path = "competitors_test.rs"]
mod tests;
