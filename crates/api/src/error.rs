use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Message returned for every upstream failure. Backend detail never leaks
/// past this string.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Upstream request failed";

/// Relay-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
/// All upstream variants collapse into the same 502 payload so callers cannot
/// tell a slow backend from a broken one; both are retryable.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The backend could not be reached (connection refused, DNS, reset).
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),

    /// The backend did not finish responding before the relay deadline.
    #[error("Upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    /// The backend response could not be represented in the relayed response.
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// The inbound request itself could not be read (e.g. broken multipart).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenience type alias for handler return values.
pub type RelayResult<T> = Result<T, RelayError>;

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            RelayError::UpstreamUnavailable(err) => {
                tracing::error!(error = %err, connect = err.is_connect(), "Upstream unavailable");
                upstream_failure()
            }
            RelayError::UpstreamTimeout(deadline) => {
                tracing::error!(deadline_secs = deadline.as_secs_f64(), "Upstream timed out");
                upstream_failure()
            }
            RelayError::MalformedUpstreamResponse(msg) => {
                tracing::error!(error = %msg, "Upstream response could not be mirrored");
                upstream_failure()
            }
            RelayError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn upstream_failure() -> (StatusCode, &'static str, String) {
    (
        StatusCode::BAD_GATEWAY,
        "BAD_GATEWAY",
        UPSTREAM_FAILURE_MESSAGE.to_string(),
    )
}
