use axum::Json;
use serde_json::{json, Value};

/// Liveness probe, deliberately unauthenticated.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
