pub mod auth;
pub mod health;
pub mod tools;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (gated behind the shared API key middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health));

    let protected = Router::new()
        .route("/mcp/resources", get(tools::list_resources))
        .route("/mcp/tools", get(tools::list_tools))
        .route("/mcp/call-tool", post(tools::call_tool))
        .route("/mcp/sessions/:client_id", delete(tools::remove_session))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_key));

    public.merge(protected)
}
