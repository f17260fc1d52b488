//! Integration tests for the SerpAPI and Gemini clients using wiremock HTTP mocks.

use std::sync::Arc;
use std::time::Duration;

use listingseo_core::Marketplace;
use listingseo_engine::providers::{
    GeminiClient, SearchProvider, SerpApiClient, TextGenerator, TrendsSource,
};
use listingseo_engine::{BoundedCache, CompetitorSource, ContentGenerator, ProviderError};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn serpapi(base_url: &str) -> SerpApiClient {
    SerpApiClient::with_base_url("test-key", 5, base_url)
        .expect("client construction should not fail")
}

fn gemini(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", "test-model", 5, base_url)
        .expect("client construction should not fail")
}

// ---------------------------------------------------------------------------
// SerpAPI search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_site_returns_organic_results() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "organic_results": [
            {
                "title": "Logitech M331 Silent Wireless Mouse",
                "link": "https://www.amazon.in/dp/B01",
                "rich_snippet": {
                    "bottom": {
                        "detected_extensions": { "price": 1299.0, "rating": 4.4 }
                    }
                }
            },
            { "title": "  ", "link": "https://www.amazon.in/dp/blank" },
            { "title": "HP Wireless Mouse", "link": "https://www.amazon.in/dp/B02" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .and(query_param("q", "\"wireless mouse\" site:amazon.in"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let hits = serpapi(&server.uri())
        .search_site("wireless mouse", "amazon.in", 20)
        .await
        .expect("should parse results");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Logitech M331 Silent Wireless Mouse");
    assert_eq!(hits[0].link, "https://www.amazon.in/dp/B01");
    assert_eq!(hits[0].price, Some(1299.0));
    assert_eq!(hits[0].rating, Some(4.4));
    assert_eq!(hits[1].price, None);
}

#[tokio::test]
async fn search_site_surfaces_api_error_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Invalid API key." })),
        )
        .mount(&server)
        .await;

    let err = serpapi(&server.uri())
        .search_site("mouse", "amazon.in", 20)
        .await
        .expect_err("should fail");

    assert!(matches!(err, ProviderError::Api { message, .. } if message == "Invalid API key."));
}

#[tokio::test]
async fn search_site_maps_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = serpapi(&server.uri())
        .search_site("mouse", "amazon.in", 20)
        .await
        .expect_err("should fail");

    assert!(matches!(err, ProviderError::Status { status: 429, .. }));
}

#[tokio::test]
async fn competitor_source_uses_live_results_and_caches_them() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "organic_results": [
                { "title": "Boat Rockerz 450 Headphones", "link": "https://www.flipkart.com/p/1" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search: Arc<dyn SearchProvider> = Arc::new(serpapi(&server.uri()));
    let source = CompetitorSource::new(
        Some(search),
        Arc::new(BoundedCache::new(8, Duration::from_secs(60))),
        Duration::from_secs(5),
    );

    let first = source.fetch("Headphones", Marketplace::Flipkart).await;
    let second = source.fetch("headphones", Marketplace::Flipkart).await;

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].keywords, vec!["boat", "rockerz", "450", "headphones"]);
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// SerpAPI trends
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interest_over_time_reads_first_series_value() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "interest_over_time": {
            "timeline_data": [
                { "date": "Jan 2025", "values": [{ "query": "mouse", "value": "40", "extracted_value": 40 }] },
                { "date": "Feb 2025", "values": [{ "query": "mouse", "value": "55" }] },
                { "date": "Mar 2025", "values": [] },
                { "date": "Apr 2025", "values": [{ "query": "mouse", "value": "<1", "extracted_value": 0 }] }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_trends"))
        .and(query_param("q", "mouse"))
        .and(query_param("geo", "IN"))
        .and(query_param("data_type", "TIMESERIES"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let series = serpapi(&server.uri())
        .interest_over_time("mouse", "IN")
        .await
        .expect("should parse series");

    assert_eq!(series, vec![40.0, 55.0, 0.0]);
}

#[tokio::test]
async fn interest_over_time_without_timeline_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let series = serpapi(&server.uri())
        .interest_over_time("mouse", "IN")
        .await
        .expect("empty body is not an error");

    assert!(series.is_empty());
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_concatenates_candidate_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{ "parts": [{ "text": "hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hi " }, { "text": "there" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        })))
        .mount(&server)
        .await;

    let text = gemini(&server.uri())
        .generate("hello")
        .await
        .expect("should return text");

    assert_eq!(text, "Hi there");
}

#[tokio::test]
async fn generate_rejects_empty_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
        )
        .mount(&server)
        .await;

    let err = gemini(&server.uri())
        .generate("hello")
        .await
        .expect_err("should fail");

    assert!(matches!(err, ProviderError::Api { .. }));
}

#[tokio::test]
async fn content_generator_parses_model_json() {
    let server = MockServer::start().await;

    let answer = "Here you go:\n{\"title\": \"Silent Wireless Mouse\", \
                  \"description\": \"Quiet clicks.\", \
                  \"keywords\": [\"silent mouse\", \"Wireless\"], \"seoScore\": 91.6}";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": answer }] } }]
        })))
        .mount(&server)
        .await;

    let model: Arc<dyn TextGenerator> = Arc::new(gemini(&server.uri()));
    let generator = ContentGenerator::new(Some(model), Duration::from_secs(5));
    let keywords = vec!["wireless".to_string(), "mouse".to_string()];
    let titles = vec!["Logitech Wireless Mouse".to_string()];

    let content = generator
        .generate(&listingseo_engine::content::ContentRequest {
            product_name: "Wireless Mouse",
            product_description: "",
            competitor_titles: &titles,
            keywords: &keywords,
            marketplace: Marketplace::Amazon,
        })
        .await;

    assert_eq!(content.optimized_title, "Silent Wireless Mouse");
    assert_eq!(content.optimized_description, "Quiet clicks.");
    assert_eq!(content.seo_score, 92);
    assert_eq!(
        content.recommended_keywords,
        vec!["silent mouse", "Wireless", "mouse"]
    );
    assert_eq!(content.raw_response, answer);
    assert!(!content.prompt.is_empty());
}

#[tokio::test]
async fn content_generator_falls_back_on_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let model: Arc<dyn TextGenerator> = Arc::new(gemini(&server.uri()));
    let generator = ContentGenerator::new(Some(model), Duration::from_secs(5));

    let content = generator
        .generate(&listingseo_engine::content::ContentRequest {
            product_name: "Desk Lamp",
            product_description: "LED",
            competitor_titles: &[],
            keywords: &[],
            marketplace: Marketplace::Flipkart,
        })
        .await;

    assert_eq!(content.optimized_title, "Desk Lamp");
    assert_eq!(content.seo_score, 73);
    assert!(content.recommended_keywords.is_empty());
}
