use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use listingseo_core::{Marketplace, NewCompetitorListing};
use rust_decimal::Decimal;

use super::*;
use crate::error::ProviderError;
use crate::providers::{SearchHit, SearchProvider};

struct FixedSearch {
    hits: Vec<SearchHit>,
    calls: AtomicUsize,
}

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn search_site(
        &self,
        _query: &str,
        _domain: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search_site(
        &self,
        _query: &str,
        _domain: &str,
        _limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        Err(ProviderError::Status {
            provider: "test",
            status: 429,
        })
    }
}

struct HangingSearch;

#[async_trait]
impl SearchProvider for HangingSearch {
    async fn search_site(
        &self,
        _query: &str,
        _domain: &str,
        _limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

fn cache() -> Arc<CompetitorCache> {
    Arc::new(BoundedCache::new(16, Duration::from_secs(3600)))
}

fn hit(title: &str, link: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        link: link.to_string(),
        price: None,
        rating: None,
    }
}

#[tokio::test]
async fn no_search_key_yields_five_synthetic_listings() {
    let source = CompetitorSource::new(None, cache(), Duration::from_secs(7));

    let listings = source.fetch("Wireless Mouse", Marketplace::Amazon).await;
    let titles: Vec<&str> = listings.iter().map(|l| l.title.as_str()).collect();

    assert_eq!(
        titles,
        vec![
            "Wireless Mouse original",
            "Wireless Mouse premium",
            "Wireless Mouse best price",
            "Wireless Mouse latest model",
            "Wireless Mouse top rated",
        ]
    );
    assert!(listings.iter().all(|l| l.url.starts_with("https://www.amazon.in/")));
    assert_eq!(listings[2].keywords, vec!["wireless", "mouse", "best", "price"]);
    assert!(listings.iter().all(|l| l.price.is_none() && l.rating.is_none()));
}

#[tokio::test]
async fn synthetic_urls_follow_the_marketplace_domain() {
    let listings = synthetic_listings("Steel Bottle", Marketplace::Meesho.domain());

    assert_eq!(listings.len(), 5);
    assert_eq!(
        listings[0].url,
        "https://www.meesho.com/s?k=steel+bottle+original"
    );
}

#[tokio::test]
async fn live_results_map_titles_to_keywords_and_prices() {
    let search = Arc::new(FixedSearch {
        hits: vec![SearchHit {
            title: "Logitech M331 Silent Wireless Mouse".to_string(),
            link: "https://www.amazon.in/dp/B01".to_string(),
            price: Some(1_295.0),
            rating: Some(4.3),
        }],
        calls: AtomicUsize::new(0),
    });
    let source = CompetitorSource::new(Some(search), cache(), Duration::from_secs(7));

    let listings = source.fetch("Wireless Mouse", Marketplace::Amazon).await;

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].url, "https://www.amazon.in/dp/B01");
    assert_eq!(
        listings[0].keywords,
        vec!["logitech", "m331", "silent", "wireless", "mouse"]
    );
    assert_eq!(listings[0].price, Some(Decimal::new(129_500, 2)));
    assert_eq!(listings[0].rating, Some(4.3));
}

#[tokio::test]
async fn search_failure_degrades_to_synthetic() {
    let source = CompetitorSource::new(Some(Arc::new(FailingSearch)), cache(), Duration::from_secs(7));

    let listings = source.fetch("Desk Lamp", Marketplace::Flipkart).await;

    assert_eq!(listings.len(), 5);
    assert_eq!(listings[0].title, "Desk Lamp original");
}

#[tokio::test(start_paused = true)]
async fn search_timeout_degrades_to_synthetic() {
    let source = CompetitorSource::new(Some(Arc::new(HangingSearch)), cache(), Duration::from_secs(7));

    let listings = source.fetch("Desk Lamp", Marketplace::Amazon).await;

    assert_eq!(listings.len(), 5);
}

#[tokio::test]
async fn empty_live_result_degrades_to_synthetic() {
    let search = Arc::new(FixedSearch {
        hits: Vec::new(),
        calls: AtomicUsize::new(0),
    });
    let source = CompetitorSource::new(Some(search), cache(), Duration::from_secs(7));

    let listings = source.fetch("Desk Lamp", Marketplace::Amazon).await;

    assert_eq!(listings.len(), 5);
}

#[tokio::test]
async fn repeated_fetch_is_served_from_cache_case_insensitively() {
    let search = Arc::new(FixedSearch {
        hits: vec![hit("Some Mouse", "https://www.amazon.in/dp/1")],
        calls: AtomicUsize::new(0),
    });
    let source = CompetitorSource::new(Some(search.clone()), cache(), Duration::from_secs(7));

    let first = source.fetch("Wireless Mouse", Marketplace::Amazon).await;
    let second = source.fetch("wireless mouse", Marketplace::Amazon).await;
    let other_site = source.fetch("Wireless Mouse", Marketplace::Flipkart).await;

    assert_eq!(first, second);
    assert_eq!(other_site.len(), 1);
    assert_eq!(search.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn dedupe_listings_uses_url_then_title() {
    let listing = |title: &str, url: &str| NewCompetitorListing {
        title: title.to_string(),
        url: url.to_string(),
        keywords: Vec::new(),
        price: None,
        rating: None,
    };

    let deduped = dedupe_listings(
        vec![
            listing("A", "https://x/1"),
            listing("B", "HTTPS://X/1"),
            listing("C", ""),
            listing("c", " "),
            listing("D", "https://x/2"),
        ],
        MAX_COMPETITORS,
    );

    let titles: Vec<&str> = deduped.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "C", "D"]);
}

#[test]
fn dedupe_listings_caps_output() {
    let listings: Vec<NewCompetitorListing> = (0..30)
        .map(|i| NewCompetitorListing {
            title: format!("Listing {i}"),
            url: format!("https://x/{i}"),
            keywords: Vec::new(),
            price: None,
            rating: None,
        })
        .collect();

    assert_eq!(dedupe_listings(listings, MAX_COMPETITORS).len(), 20);
}
