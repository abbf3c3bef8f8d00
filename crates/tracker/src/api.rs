//! REST API client for the backend job endpoints.
//!
//! Wraps `GET /jobs`, `GET /jobs/{id}` and `POST /jobs` using [`reqwest`].
//! The base URL is normally the relay mount (e.g.
//! `http://localhost:3000/api/proxy`), so every call inherits the relay's
//! deadline and no extra call-level timeout is applied here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sheetdesk_core::job::{Job, JobListQuery, SubmitJob};

use crate::credentials::{CredentialProvider, NoCredentials};

/// Errors from the job REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum JobsApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend (or the relay in front of it) returned a non-2xx status.
    #[error("Job API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured base URL cannot carry a job path.
    #[error("Invalid jobs API URL: {0}")]
    InvalidUrl(String),
}

/// Anything that can produce the current job list for a type filter.
///
/// [`JobsApi`] is the production source; the tracker only depends on this
/// seam.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn list_jobs(&self, job_type: Option<&str>) -> Result<Vec<Job>, JobsApiError>;
}

/// Accepts both a bare payload and the `{ "data": ... }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Bare(T),
    Wrapped { data: T },
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Bare(inner) | Envelope::Wrapped { data: inner } => inner,
        }
    }
}

/// HTTP client for the backend job API.
#[derive(Clone)]
pub struct JobsApi {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl JobsApi {
    /// Create a client for `base_url` with no credentials.
    ///
    /// * `base_url` - e.g. `http://localhost:3000/api/proxy`. A trailing
    ///   slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for sharing one connection pool across trackers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.strip_suffix('/').unwrap_or(&base_url).to_string();
        Self {
            client,
            base_url,
            credentials: Arc::new(NoCredentials),
        }
    }

    /// Attach a credential provider consulted on every request.
    pub fn with_credentials(mut self, credentials: impl CredentialProvider + 'static) -> Self {
        self.credentials = Arc::new(credentials);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List jobs, optionally filtered by type, in backend order.
    ///
    /// Sends `GET /jobs[?job_type=...]`.
    pub async fn list_jobs(&self, job_type: Option<&str>) -> Result<Vec<Job>, JobsApiError> {
        let query = JobListQuery {
            job_type: job_type.map(str::to_string),
        };

        let response = self
            .authorize(self.client.get(format!("{}/jobs", self.base_url)))
            .query(&query)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch a single job. Sends `GET /jobs/{id}` with `id` as one
    /// percent-encoded path segment.
    pub async fn get_job(&self, id: &str) -> Result<Job, JobsApiError> {
        let url = self.job_url(id)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a new job. Sends `POST /jobs` and returns the created record,
    /// normally in `pending` status.
    pub async fn submit_job(&self, input: &SubmitJob) -> Result<Job, JobsApiError> {
        let response = self
            .authorize(self.client.post(format!("{}/jobs", self.base_url)))
            .json(input)
            .send()
            .await?;

        let job: Job = Self::parse_response(response).await?;
        tracing::info!(job_id = %job.id, job_type = %job.job_type, "Job submitted");
        Ok(job)
    }

    // ---- private helpers ----

    fn job_url(&self, id: &str) -> Result<reqwest::Url, JobsApiError> {
        let mut url = reqwest::Url::parse(&format!("{}/jobs", self.base_url))
            .map_err(|e| JobsApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| JobsApiError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`JobsApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, JobsApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(JobsApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body, bare or enveloped.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobsApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.into_inner())
    }
}

#[async_trait]
impl JobSource for JobsApi {
    async fn list_jobs(&self, job_type: Option<&str>) -> Result<Vec<Job>, JobsApiError> {
        JobsApi::list_jobs(self, job_type).await
    }
}
