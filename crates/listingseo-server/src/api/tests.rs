use axum::body::{to_bytes, Body};
use axum::http::Request;
use listingseo_core::{Marketplace, NewAnalysis};
use listingseo_engine::{MemoryStore, QueueSupervisor};
use tower::ServiceExt;

use super::*;

fn app_state(store: &Arc<MemoryStore>) -> (AppState, QueueSupervisor) {
    let engine = EngineServices::offline("IN");
    let store: Arc<dyn AnalysisStore> = store.clone();
    let (queue, supervisor, _failures) =
        WorkflowQueue::start(Arc::new(engine.workflow(Arc::clone(&store))), 16, 2);
    (
        AppState {
            store,
            queue,
            engine,
        },
        supervisor,
    )
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = build_app(state.clone())
        .oneshot(request)
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn seed(store: &MemoryStore, owner_id: Uuid, name: &str) -> Uuid {
    store
        .create_analysis(&NewAnalysis {
            owner_id,
            product_name: name.to_string(),
            product_description: None,
            product_features: None,
            category: None,
            marketplace: Marketplace::Flipkart,
        })
        .await
        .expect("create")
        .id
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 20);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 100);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("bad_request", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok_and_echoes_request_id() {
    let store = Arc::new(MemoryStore::new());
    let (state, _supervisor) = app_state(&store);

    let response = build_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[tokio::test]
async fn create_rejects_short_product_name_before_storing() {
    let store = Arc::new(MemoryStore::new());
    let (state, _supervisor) = app_state(&store);
    let owner = Uuid::new_v4();

    let (status, json) = send(
        &state,
        post_json(
            "/api/v1/analyses",
            &serde_json::json!({
                "ownerId": owner,
                "productName": " x ",
                "targetPlatform": "amazon"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (_, list) = send(&state, get(&format!("/api/v1/analyses?owner_id={owner}"))).await;
    assert_eq!(list["data"]["total"], 0);
}

#[tokio::test]
async fn create_rejects_unknown_platform() {
    let store = Arc::new(MemoryStore::new());
    let (state, _supervisor) = app_state(&store);

    let (status, json) = send(
        &state,
        post_json(
            "/api/v1/analyses",
            &serde_json::json!({
                "ownerId": Uuid::new_v4(),
                "productName": "Desk Lamp",
                "targetPlatform": "ebay"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn created_analysis_is_processed_and_reported() {
    let store = Arc::new(MemoryStore::new());
    let (state, supervisor) = app_state(&store);

    let (status, json) = send(
        &state,
        post_json(
            "/api/v1/analyses",
            &serde_json::json!({
                "ownerId": Uuid::new_v4(),
                "productName": "Wireless Mouse",
                "productDescription": "",
                "targetPlatform": "Amazon"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "pending");
    let id = json["data"]["id"].as_str().expect("id").to_string();

    // Dropping the last queue handle lets the supervisor drain the run.
    drop(state);
    supervisor.join().await;

    let (state, _supervisor) = app_state(&store);
    let (status, status_json) = send(&state, get(&format!("/api/v1/analyses/{id}/status"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_json["data"]["status"], "completed");
    assert!(status_json["data"]["completedAt"].is_string());

    let (status, report) = send(&state, get(&format!("/api/v1/analyses/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let data = &report["data"];
    assert_eq!(data["analysis"]["productDescription"], serde_json::Value::Null);
    assert_eq!(data["competitors"].as_array().map(Vec::len), Some(5));
    assert_eq!(data["content"]["seoScore"], 72);
    let density = data["metrics"]["keywordDensityPercent"]
        .as_i64()
        .expect("density");
    assert!((0..=100).contains(&density));
    assert!(data["tags"]["totalUnique"].as_u64().expect("tags") > 0);
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let (state, _supervisor) = app_state(&store);

    let (status, json) = send(&state, get(&format!("/api/v1/analyses/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");

    let (status, json) = send(&state, get("/api/v1/analyses/not-a-uuid/status")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn history_filters_by_owner_and_pages() {
    let store = Arc::new(MemoryStore::new());
    let owner = Uuid::new_v4();
    for name in ["Lamp One", "Lamp Two", "Lamp Three"] {
        seed(&store, owner, name).await;
    }
    seed(&store, Uuid::new_v4(), "Other Owner").await;
    let (state, _supervisor) = app_state(&store);

    let (status, json) = send(
        &state,
        get(&format!(
            "/api/v1/analyses?owner_id={owner}&status=pending&limit=2"
        )),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["items"].as_array().map(Vec::len), Some(2));

    let (status, json) = send(&state, get("/api/v1/analyses?status=archived")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn usage_counts_owner_analyses_in_window() {
    let store = Arc::new(MemoryStore::new());
    let owner = Uuid::new_v4();
    seed(&store, owner, "Lamp One").await;
    seed(&store, owner, "Lamp Two").await;
    seed(&store, Uuid::new_v4(), "Other Owner").await;
    let (state, _supervisor) = app_state(&store);

    let (status, json) = send(&state, get(&format!("/api/v1/usage?owner_id={owner}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["analysesCreated"], 2);
    assert_eq!(json["data"]["days"], 30);

    let (status, json) = send(&state, get("/api/v1/usage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}
