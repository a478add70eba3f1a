//! API request handlers with proper error propagation.
//!
//! All handlers return `Result<impl IntoResponse, ScribeError>` so that
//! errors are automatically converted to appropriate HTTP status codes via
//! the `IntoResponse` implementation on `ScribeError`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use super::{ApiResponse, AppState};
use crate::error::ScribeError;
use crate::model::{Collection, Entity};

// ═══════════════════════════════════════════════════════════════════════════════
// Health and Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.check_health().await;
    let status = StatusCode::from_u16(report.status.to_http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report))
}

pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Record Handlers
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(entity): Json<Entity>,
) -> Result<impl IntoResponse, ScribeError> {
    let collection = Collection::parse(collection)?;

    let created = state.writer.create(&collection, entity).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ScribeError> {
    let collection = Collection::parse(collection)?;

    let entity = state.writer.read(&collection, &id).await?;

    Ok(Json(ApiResponse::success(entity)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ScribeError> {
    let collection = Collection::parse(collection)?;
    let entity = entity_from_body(&id, body)?;

    let updated = state.writer.update(&collection, entity).await?;

    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ScribeError> {
    let collection = Collection::parse(collection)?;

    state.writer.delete(&collection, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Build the entity to write from a PUT body and the path id.
///
/// The body may omit `id` (the path is authoritative), but a body id that
/// contradicts the path id is rejected rather than silently ignored.
fn entity_from_body(path_id: &str, body: Value) -> Result<Entity, ScribeError> {
    let mut fields = match body {
        Value::Object(map) => map,
        _ => return Err(ScribeError::validation("request body must be a JSON object")),
    };

    if let Some(body_id) = fields.remove("id") {
        match body_id.as_str() {
            Some(s) if s == path_id => {}
            _ => {
                return Err(ScribeError::validation(
                    "body id does not match the id in the request path",
                ))
            }
        }
    }

    Ok(Entity::new(path_id, fields))
}
