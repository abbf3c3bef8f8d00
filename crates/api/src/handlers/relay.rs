//! Catch-all handler for everything below the relay mount point.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::response::Response;

use crate::error::{RelayError, RelayResult};
use crate::relay::{forward_headers, is_bodyless, is_multipart, FormPart, ProxiedExchange, RelayBody};
use crate::state::AppState;

/// ANY /api/proxy/{*path}
///
/// Forward the request to the backend origin and mirror the response.
pub async fn relay_request(State(state): State<AppState>, request: Request) -> RelayResult<Response> {
    let method = request.method().clone();
    let target = state
        .relay
        .target_url(request.uri().path(), request.uri().query());
    let bodyless = is_bodyless(&method);
    let multipart = !bodyless && is_multipart(request.headers());
    let headers = forward_headers(request.headers(), multipart);

    // GET/HEAD never carry a body, whatever their Content-Type says.
    let body = if bodyless {
        RelayBody::Empty
    } else if multipart {
        let form = Multipart::from_request(request, &state)
            .await
            .map_err(|e| RelayError::InvalidRequest(e.body_text()))?;
        RelayBody::Multipart(collect_parts(form).await?)
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(|e| RelayError::InvalidRequest(format!("Failed to read request body: {e}")))?;
        if bytes.is_empty() {
            RelayBody::Empty
        } else {
            RelayBody::Bytes(bytes)
        }
    };

    state
        .relay
        .forward(ProxiedExchange {
            method,
            target,
            headers,
            body,
        })
        .await
}

/// Drain every part of an inbound multipart body into memory.
async fn collect_parts(mut form: Multipart) -> RelayResult<Vec<FormPart>> {
    let mut parts = Vec::new();

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| RelayError::InvalidRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| RelayError::InvalidRequest(e.body_text()))?;

        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    tracing::debug!(parts = parts.len(), "Decoded multipart body");
    Ok(parts)
}
