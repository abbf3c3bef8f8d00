use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Origin relayed requests are forwarded to.
    pub backend_url: String,
}

/// GET /health -- returns relay status. Never touches the backend.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend_url: state.relay.backend_url().to_string(),
    })
}

/// Mount health check routes (root level, outside the relay mount).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
