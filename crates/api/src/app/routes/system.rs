//! Liveness endpoint.

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET /health - liveness probe
pub async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "status": "ok" }))
}
