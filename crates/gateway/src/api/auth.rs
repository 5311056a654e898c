//! API authentication middleware.
//!
//! Reads the env var named by `config.server.api_key_env` (default `AF_API_KEY`)
//! **once at startup** and caches the SHA-256 digest in `AppState`.
//! - If the env var is set and non-empty, every `/mcp/*` request must carry
//!   `x-api-key: <key>` or `Authorization: Bearer <key>`.
//! - If the env var is unset or empty, the server logs a warning once and
//!   allows unauthenticated access (dev mode).

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Axum middleware that enforces the shared API key on protected routes.
/// Attach via `axum::middleware::from_fn_with_state`.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected_hash = match &state.api_key_hash {
        Some(h) => h,
        None => return next.run(req).await,
    };

    let provided = provided_key(req.headers()).unwrap_or("");

    // Hash the provided key to a fixed-length digest, then compare in
    // constant time.
    let provided_hash = Sha256::digest(provided.as_bytes());

    if !bool::from(provided_hash.ct_eq(expected_hash.as_slice())) {
        tracing::warn!(path = %req.uri().path(), "rejected request with invalid API key");
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "Invalid API key" })),
        )
            .into_response();
    }

    next.run(req).await
}

/// `x-api-key` wins over `Authorization: Bearer`.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
}
