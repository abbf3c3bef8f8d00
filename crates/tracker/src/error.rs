use crate::api::JobsApiError;

/// Errors surfaced by [`JobTracker`](crate::tracker::JobTracker) operations.
///
/// The poll loop itself never stops on these; they only reach callers of
/// `query()` / `refresh()`.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// A single query failed. The previous snapshot is still in place.
    #[error("Job query failed: {0}")]
    QueryFailed(#[from] JobsApiError),

    /// The tracker was disposed; its results would have nowhere to go.
    #[error("Tracker has been disposed")]
    Disposed,
}
