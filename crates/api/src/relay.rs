//! Transparent HTTP relay to the backend service.
//!
//! [`RelayClient`] forwards one inbound request per call to the configured
//! backend origin and mirrors the backend response. Header handling is driven
//! by two explicit deny tables so the forwarding policy can be audited in one
//! place:
//!
//! - [`STRIPPED_REQUEST_HEADERS`]: connection-scoped request headers that the
//!   outbound transport recomputes.
//! - [`HOP_BY_HOP_RESPONSE_HEADERS`]: response headers that describe the
//!   backend connection rather than the payload.
//!
//! Every forwarded call runs under a hard deadline. When it expires the
//! in-flight future is dropped, which aborts the call and returns its pooled
//! connection.

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Method, Response, StatusCode};

use crate::error::{RelayError, RelayResult};

/// Path prefix every relayed request lives under.
pub const RELAY_MOUNT: &str = "/api/proxy";

/// Request headers never copied to the outbound call.
pub const STRIPPED_REQUEST_HEADERS: [&str; 3] = ["host", "content-length", "transfer-encoding"];

/// Response headers never copied back to the caller.
pub const HOP_BY_HOP_RESPONSE_HEADERS: [&str; 3] = ["connection", "keep-alive", "transfer-encoding"];

/// One decoded `multipart/form-data` part.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Inbound body, classified by how it must be re-sent.
#[derive(Debug, Clone)]
pub enum RelayBody {
    /// `GET`/`HEAD`, or nothing was sent.
    Empty,
    /// Opaque bytes, forwarded as-is.
    Bytes(Bytes),
    /// Form parts, re-encoded with a fresh boundary.
    Multipart(Vec<FormPart>),
}

impl RelayBody {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayBody::Empty => "empty",
            RelayBody::Bytes(_) => "bytes",
            RelayBody::Multipart(_) => "multipart",
        }
    }
}

/// Everything needed to issue the outbound half of one relayed call.
#[derive(Debug)]
pub struct ProxiedExchange {
    pub method: Method,
    pub target: String,
    pub headers: HeaderMap,
    pub body: RelayBody,
}

/// Outbound client bound to a single backend origin.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    backend_url: String,
    deadline: Duration,
}

impl RelayClient {
    /// Create a relay for `backend_url` with its own connection pool.
    ///
    /// Redirects are not followed: a backend 3xx is mirrored to the caller
    /// with its `Location` header.
    pub fn new(backend_url: String, deadline: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client, backend_url, deadline))
    }

    /// Create a relay reusing an existing [`reqwest::Client`].
    ///
    /// The client should be built with `redirect::Policy::none()`, otherwise
    /// backend redirects are followed instead of mirrored.
    pub fn with_client(client: reqwest::Client, backend_url: String, deadline: Duration) -> Self {
        Self {
            client,
            backend_url,
            deadline,
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Build the outbound URL: origin, then the path below the mount point,
    /// then the original query string. No normalization is applied.
    pub fn target_url(&self, inbound_path: &str, query: Option<&str>) -> String {
        let suffix = inbound_path
            .strip_prefix(RELAY_MOUNT)
            .unwrap_or(inbound_path);
        match query {
            Some(q) => format!("{}{}?{}", self.backend_url, suffix, q),
            None => format!("{}{}", self.backend_url, suffix),
        }
    }

    /// Forward `exchange` to the backend and mirror its response.
    ///
    /// The deadline covers sending the request and reading the full response
    /// body.
    pub async fn forward(&self, exchange: ProxiedExchange) -> RelayResult<Response<Body>> {
        let ProxiedExchange {
            method,
            target,
            headers,
            body,
        } = exchange;

        tracing::debug!(%method, target = %target, body = body.kind(), "Relaying request");

        let request = self.build_request(method.clone(), &target, headers, body)?;
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.deadline, async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, bytes))
        })
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Err(_) => {
                tracing::warn!(%method, target = %target, elapsed_ms, "Relayed call hit deadline, aborted");
                Err(RelayError::UpstreamTimeout(self.deadline))
            }
            Ok(Err(err)) => {
                tracing::warn!(%method, target = %target, elapsed_ms, error = %err, "Relayed call failed");
                Err(RelayError::UpstreamUnavailable(err))
            }
            Ok(Ok((status, headers, bytes))) => {
                tracing::info!(
                    %method,
                    target = %target,
                    status = status.as_u16(),
                    bytes = bytes.len(),
                    elapsed_ms,
                    "Relayed call completed",
                );
                mirror_response(status, &headers, bytes)
            }
        }
    }

    fn build_request(
        &self,
        method: Method,
        target: &str,
        headers: HeaderMap,
        body: RelayBody,
    ) -> RelayResult<reqwest::RequestBuilder> {
        let builder = self.client.request(method, target).headers(headers);

        let builder = match body {
            RelayBody::Empty => builder,
            RelayBody::Bytes(bytes) => builder.body(bytes),
            RelayBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        Ok(builder)
    }
}

/// Re-encode decoded parts; reqwest picks the boundary.
fn build_form(parts: Vec<FormPart>) -> RelayResult<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let mut encoded = reqwest::multipart::Part::bytes(part.data.to_vec());
        if let Some(file_name) = part.file_name {
            encoded = encoded.file_name(file_name);
        }
        if let Some(content_type) = part.content_type {
            encoded = encoded.mime_str(&content_type).map_err(|e| {
                RelayError::InvalidRequest(format!(
                    "Invalid content type '{content_type}' on part '{}': {e}",
                    part.name
                ))
            })?;
        }
        form = form.part(part.name, encoded);
    }
    Ok(form)
}

/// Whether the inbound `Content-Type` is `multipart/form-data`.
pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

/// Whether `method` never carries a forwarded body.
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn is_stripped_request_header(name: &HeaderName) -> bool {
    STRIPPED_REQUEST_HEADERS.contains(&name.as_str())
}

fn is_hop_by_hop_response_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_RESPONSE_HEADERS.contains(&name.as_str())
}

/// Copy inbound headers for the outbound call.
///
/// Drops [`STRIPPED_REQUEST_HEADERS`]. For multipart bodies `Content-Type` is
/// dropped as well so the regenerated boundary wins.
pub fn forward_headers(inbound: &HeaderMap, multipart: bool) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_stripped_request_header(name) {
            continue;
        }
        if multipart && name == header::CONTENT_TYPE {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    outbound
}

/// Build the caller-facing response from the backend's status, headers and
/// body bytes.
pub fn mirror_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: Bytes,
) -> RelayResult<Response<Body>> {
    let mut builder = Response::builder().status(status);
    if let Some(out) = builder.headers_mut() {
        for (name, value) in headers {
            if !is_hop_by_hop_response_header(name) {
                out.append(name.clone(), value.clone());
            }
        }
    }
    builder
        .body(Body::from(body))
        .map_err(|e| RelayError::MalformedUpstreamResponse(e.to_string()))
}
