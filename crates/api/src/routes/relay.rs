//! Route definitions for the relay mount point.

use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use axum::Router;

use crate::handlers::relay;
use crate::relay::RELAY_MOUNT;
use crate::state::AppState;

/// Routes covering the mount point and everything below it, for any method.
///
/// ```text
/// ANY /api/proxy             -> relay_request
/// ANY /api/proxy/            -> relay_request
/// ANY /api/proxy/{*path}     -> relay_request
/// ```
///
/// The default body limit is disabled: relayed bodies have no size cap.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(RELAY_MOUNT, any(relay::relay_request))
        .route(&format!("{RELAY_MOUNT}/"), any(relay::relay_request))
        .route(&format!("{RELAY_MOUNT}/{{*path}}"), any(relay::relay_request))
        .layer(DefaultBodyLimit::disable())
}
