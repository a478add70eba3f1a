//! HTTP-level tests for the records API.
//!
//! Drive the full router with in-memory backends through `tower::ServiceExt`
//! so routing, extraction, status mapping, and the response envelope are all
//! covered without a network listener.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use scribe_core::api::{build_router, AppState};
use scribe_core::publisher::{EventPublisher, MemoryPublisher};
use scribe_core::store::{MemoryStore, RecordStore};
use scribe_core::writer::{EntityWriter, WriterConfig};

// ============================================================================
// Helpers
// ============================================================================

struct TestApp {
    router: axum::Router,
    publisher: Arc<MemoryPublisher>,
}

fn test_app() -> TestApp {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let publisher = Arc::new(MemoryPublisher::new());

    let store_dyn: Arc<dyn RecordStore> = store.clone();
    let publisher_dyn: Arc<dyn EventPublisher> = publisher.clone();

    let writer = EntityWriter::new(
        store_dyn.clone(),
        publisher_dyn.clone(),
        WriterConfig::default(),
    );
    let state = AppState::new(writer, store_dyn, publisher_dyn, None);

    TestApp {
        router: build_router(state),
        publisher,
    }
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// CRUD Round Trips
// ============================================================================

#[tokio::test]
async fn test_create_returns_201_with_envelope() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(
            Method::POST,
            "/api/v1/records/users",
            Some(json!({ "id": "1", "name": "Ann" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "1");
    assert_eq!(body["data"]["name"], "Ann");

    let events = app.publisher.published_for("1");
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_get_round_trip() {
    let app = test_app();

    app.router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/records/users",
            Some(json!({ "id": "1", "name": "Ann" })),
        ))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(request(Method::GET, "/api/v1/records/users/1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Ann");
}

#[tokio::test]
async fn test_get_missing_record_returns_404() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(Method::GET, "/api/v1/records/users/ghost", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RECORD_NOT_FOUND");
}

#[tokio::test]
async fn test_put_upserts_and_returns_200() {
    let app = test_app();

    // No prior create: PUT on a missing id creates the record
    let response = app
        .router
        .clone()
        .oneshot(request(
            Method::PUT,
            "/api/v1/records/users/1",
            Some(json!({ "name": "Ann" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], "1");

    let response = app
        .router
        .oneshot(request(Method::GET, "/api/v1/records/users/1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_put_with_mismatched_body_id_returns_422() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(
            Method::PUT,
            "/api/v1/records/users/1",
            Some(json!({ "id": "2", "name": "Ann" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_delete_returns_204_even_for_missing_id() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(request(Method::DELETE, "/api/v1/records/users/ghost", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let events = app.publisher.published_for("ghost");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, json!({ "id": "ghost" }));
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_invalid_collection_name_is_rejected() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(Method::GET, "/api/v1/records/Users!/1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_with_empty_id_is_rejected() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(
            Method::POST,
            "/api/v1/records/users",
            Some(json!({ "id": "", "name": "Ann" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.publisher.published().is_empty());
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_exposes_request_latency() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let publisher: Arc<dyn EventPublisher> = Arc::new(MemoryPublisher::new());
    let writer = EntityWriter::new(store.clone(), publisher.clone(), WriterConfig::default());

    // Sole caller of the global recorder install in this test binary
    let handle = scribe_core::observability::init_metrics().unwrap();
    let router = build_router(AppState::new(writer, store, publisher, Some(handle)));

    router
        .clone()
        .oneshot(request(Method::GET, "/health", None))
        .await
        .unwrap();

    let response = router
        .oneshot(request(Method::GET, "/metrics", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("scribe_request_duration_seconds"));
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_both_components() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"].as_array().unwrap().len(), 2);
}
