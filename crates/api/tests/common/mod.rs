use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{self, any, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceExt;

use sheetdesk_api::config::ServerConfig;
use sheetdesk_api::relay::RelayClient;
use sheetdesk_api::router::build_app_router;
use sheetdesk_api::state::AppState;

/// Build a test `ServerConfig` pointing at `backend_url`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default).
pub fn test_config(backend_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        backend_url: backend_url.to_string(),
        relay_timeout_secs: 300,
        request_timeout_secs: 330,
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// relaying to `backend_url` with the default deadline.
pub fn build_test_app(backend_url: &str) -> Router {
    build_test_app_with_deadline(backend_url, Duration::from_secs(300))
}

/// Same as [`build_test_app`] with a custom relay deadline.
pub fn build_test_app_with_deadline(backend_url: &str, deadline: Duration) -> Router {
    let config = test_config(backend_url);
    let state = AppState {
        relay: RelayClient::new(config.backend_url.clone(), deadline).unwrap(),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Serve `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

/// Jobs served by the fake backend's `/jobs` endpoint, plus the query strings
/// it has seen.
#[derive(Clone, Default)]
pub struct BackendJobs {
    pub jobs: Arc<Mutex<Vec<Value>>>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

/// Token the fake backend requires on `/jobs`.
pub const BACKEND_TOKEN: &str = "backend-token";

/// Start a fake backend service and return its origin (`http://127.0.0.1:N`).
///
/// ```text
/// ANY  /                 -> "root"
/// ANY  /echo/{*rest}     -> JSON description of the received request
/// ANY  /raw              -> 201, raw body echoed, x-method / x-backend headers
/// POST /upload           -> JSON description of the received multipart form
/// GET  /slow             -> responds after 5 s
/// GET  /missing          -> 404 with JSON detail
/// GET  /moved            -> 302 to /target
/// GET  /target           -> "followed"
/// GET  /jobs             -> { "data": [...] } (requires bearer token)
/// ```
pub async fn spawn_backend(jobs: BackendJobs) -> String {
    let app = Router::new()
        .route("/", any(|| async { "root" }))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/raw", any(raw))
        .route("/upload", post(upload))
        .route("/slow", routing::get(slow))
        .route("/missing", routing::get(missing))
        .route("/moved", routing::get(moved))
        .route("/target", routing::get(|| async { "followed" }))
        .route("/jobs", routing::get(list_jobs))
        .layer(DefaultBodyLimit::disable())
        .with_state(jobs);

    let addr = serve(app).await;
    format!("http://{addr}")
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": headers,
        "body": body.to_vec(),
    }))
}

async fn raw(method: Method, body: Bytes) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        [
            ("x-method", method.as_str().to_string()),
            ("x-backend", "raw".to_string()),
            ("content-type", "application/octet-stream".to_string()),
        ],
        body,
    )
}

async fn upload(headers: HeaderMap, mut multipart: Multipart) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let part_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap();
        fields.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": part_type,
            "data": data.to_vec(),
        }));
    }

    Json(json!({ "content_type": content_type, "fields": fields }))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

async fn missing() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [("x-backend", "missing")],
        Json(json!({ "detail": "not here" })),
    )
}

async fn moved() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [("location", "/target"), ("x-backend", "moved")],
        "see /target",
    )
}

#[derive(Deserialize)]
struct JobsParams {
    job_type: Option<String>,
}

async fn list_jobs(
    State(state): State<BackendJobs>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<JobsParams>,
) -> Response {
    let expected = format!("Bearer {BACKEND_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad token" }))).into_response();
    }

    state
        .queries
        .lock()
        .unwrap()
        .push(uri.query().unwrap_or_default().to_string());

    let jobs: Vec<Value> = state
        .jobs
        .lock()
        .unwrap()
        .iter()
        .filter(|job| match &params.job_type {
            Some(t) => job["job_type"] == *t,
            None => true,
        })
        .cloned()
        .collect();

    Json(json!({ "data": jobs })).into_response()
}
