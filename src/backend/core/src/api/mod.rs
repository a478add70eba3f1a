//! API layer for Scribe Core.
//!
//! The gateway translates HTTP requests into write-orchestrator calls and
//! maps outcomes to transport responses:
//!
//! - `POST   /api/v1/records/{collection}`        create → 201
//! - `GET    /api/v1/records/{collection}/{id}`   read   → 200 / 404
//! - `PUT    /api/v1/records/{collection}/{id}`   update → 200 (upsert)
//! - `DELETE /api/v1/records/{collection}/{id}`   delete → 204 (idempotent)
//!
//! Store unavailability maps to 503; a notify-phase publish failure never
//! reaches this layer at all.

mod handlers;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use metrics::histogram;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::health::{HealthService, PublisherChecker, StoreChecker};
use crate::publisher::EventPublisher;
use crate::store::RecordStore;
use crate::writer::EntityWriter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub writer: EntityWriter,
    pub health: Arc<HealthService>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire up state from the injected store and publisher clients.
    pub fn new(
        writer: EntityWriter,
        store: Arc<dyn RecordStore>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let mut health = HealthService::new(Duration::from_secs(5));
        health.register_checker(Arc::new(StoreChecker::new(store)));
        health.register_checker(Arc::new(PublisherChecker::new(publisher)));

        Self {
            writer,
            health: Arc::new(health),
            metrics,
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/api/v1/records/:collection", post(handlers::create_record))
        .route(
            "/api/v1/records/:collection/:id",
            get(handlers::get_record)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        .layer(middleware::from_fn(track_request_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Record per-request latency, labelled by the matched route template so
/// record ids do not explode label cardinality.
async fn track_request_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(req).await;

    histogram!(
        "scribe_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => response.status().as_u16().to_string()
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Success envelope for API responses.
///
/// Failures never flow through this type: handler errors are converted by
/// `ScribeError::into_response`, which emits the error body defined in the
/// error module.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
    }

    #[test]
    fn test_api_response_success_serialization_omits_missing_fields() {
        let response = ApiResponse::success(serde_json::json!({ "id": "1" }));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "1");
        assert!(json.get("error").is_none());
    }
}
