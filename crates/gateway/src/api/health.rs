//! Public liveness endpoints.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /`: service identity.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.config.server.name,
        "version": state.config.server.version,
        "status": "running",
        "mode": "direct",
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sessions": state.registry.stats(),
    }))
}
