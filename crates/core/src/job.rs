//! Job records as reported by the backend job-listing endpoint.
//!
//! The client never drives a job's lifecycle. These types only describe what
//! the backend reported in its last response, plus a few derived predicates
//! used by the tracker and the dashboard.

use serde::{Deserialize, Serialize};

use crate::types::{timestamp, JobId, Timestamp};

/// Lifecycle status of a backend job.
///
/// Closed enumeration: any other string fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job is still in flight (`pending` or `running`).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of asynchronous backend work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub job_type: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub submitted_at: Timestamp,
    #[serde(
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<Timestamp>,
    /// Position in the backend queue while `pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_total: Option<u32>,
    /// Only populated when `status = completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Only populated when `status = failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Caller-supplied context echoed back by the backend. Never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Job {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Check that `result` and `error` only appear in their matching terminal
    /// state.
    pub fn is_consistent(&self) -> bool {
        let result_ok = self.result.is_none() || self.status == JobStatus::Completed;
        let error_ok = self.error.is_none() || self.status == JobStatus::Failed;
        result_ok && error_ok
    }
}

/// Query parameters for the backend `GET /jobs` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

/// Body for the backend `POST /jobs` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJob {
    pub job_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Subset of `jobs` still in flight, preserving backend order.
pub fn active_jobs(jobs: &[Job]) -> Vec<Job> {
    jobs.iter().filter(|job| job.is_active()).cloned().collect()
}

/// Whether any job in `jobs` is still in flight.
pub fn has_active(jobs: &[Job]) -> bool {
    jobs.iter().any(Job::is_active)
}
