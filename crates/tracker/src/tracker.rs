//! Adaptive job-status poller.
//!
//! A [`JobTracker`] owns one background poll task for one job-type filter.
//! The task holds exactly one timer and re-arms it only when the poll mode
//! changes:
//!
//! ```text
//!            start: one query
//!                  |
//!        active? --+-- none active
//!           v               v
//!         Fast  <------->  Slow        (edge taken after any successful query)
//!           \               /
//!            +--> Idle <---+           (dispose / drop / filter change)
//! ```
//!
//! Timer ticks and manual refreshes share one single-flight query path. A tick
//! that fires while a query is in flight is skipped; a manual refresh waits
//! for the in-flight query and then runs its own, so snapshots are applied
//! strictly in completion order.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sheetdesk_core::job::{self, Job};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::JobSource;
use crate::config::TrackerConfig;
use crate::error::TrackerError;

/// Published, immutable view of the last successful query.
pub type Snapshot = Arc<Vec<Job>>;

/// Current cadence of a tracker's poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// No poll loop running (not started yet, or disposed).
    Idle,
    /// At least one job is pending or running.
    Fast,
    /// No job is in flight.
    Slow,
}

impl PollMode {
    /// Mode the loop should be in for `jobs`.
    pub fn for_jobs(jobs: &[Job]) -> Self {
        if job::has_active(jobs) {
            PollMode::Fast
        } else {
            PollMode::Slow
        }
    }
}

/// Live view of a user's jobs for one type filter.
///
/// Must be created inside a Tokio runtime. Dropping the tracker disposes it.
pub struct JobTracker {
    inner: Arc<Inner>,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    source: Arc<dyn JobSource>,
    filter: Option<String>,
    config: TrackerConfig,
    snapshot: watch::Sender<Snapshot>,
    mode: watch::Sender<PollMode>,
    /// Single-flight guard, held for the duration of one query.
    in_flight: Mutex<()>,
    consecutive_failures: AtomicU32,
    cancel: CancellationToken,
}

impl JobTracker {
    /// Start tracking jobs matching `filter` (all jobs when `None`).
    ///
    /// Issues one query immediately, then polls at the fast or slow interval
    /// depending on the result. Periods below
    /// [`MIN_INTERVAL`](crate::config::MIN_INTERVAL) are raised to it.
    pub fn start(source: Arc<dyn JobSource>, filter: Option<String>, config: TrackerConfig) -> Self {
        let clamped = config.clamped();
        if clamped != config {
            tracing::warn!(
                fast_interval = ?config.fast_interval,
                slow_interval = ?config.slow_interval,
                "Poll interval below minimum, clamping",
            );
        }
        let config = clamped;
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (mode, _) = watch::channel(PollMode::Idle);

        let inner = Arc::new(Inner {
            source,
            filter,
            config,
            snapshot,
            mode,
            in_flight: Mutex::new(()),
            consecutive_failures: AtomicU32::new(0),
            cancel: CancellationToken::new(),
        });

        tracing::debug!(filter = ?inner.filter, "Starting job tracker");
        let task = tokio::spawn(run_poll_loop(Arc::clone(&inner)));

        Self {
            inner,
            task: Some(task),
        }
    }

    /// Replace this tracker with a fresh one for `filter`.
    ///
    /// The old tracker is disposed first; the new one starts from an empty
    /// snapshot so stale and fresh results never mix.
    pub fn with_filter(self, filter: Option<String>) -> Self {
        let source = Arc::clone(&self.inner.source);
        let config = self.inner.config.clone();
        drop(self);
        Self::start(source, filter, config)
    }

    pub fn filter(&self) -> Option<&str> {
        self.inner.filter.as_deref()
    }

    /// Perform one round-trip now and replace the snapshot on success.
    ///
    /// On failure the previous snapshot is kept and the error is returned;
    /// the poll loop is unaffected.
    pub async fn query(&self) -> Result<Snapshot, TrackerError> {
        self.inner.query().await
    }

    /// Manual refresh (e.g. right after submitting a job).
    ///
    /// Goes through the same single-flight path as timer ticks and leaves the
    /// timer alone unless the result changes the poll mode.
    pub async fn refresh(&self) -> Result<Snapshot, TrackerError> {
        tracing::debug!(filter = ?self.inner.filter, "Manual refresh requested");
        self.inner.query().await
    }

    /// The last successful snapshot (empty before the first success).
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.inner.snapshot.borrow())
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Jobs from the current snapshot that are pending or running.
    pub fn active_jobs(&self) -> Vec<Job> {
        job::active_jobs(&self.inner.snapshot.borrow())
    }

    /// First job of the current snapshot, in backend order.
    pub fn latest_job(&self) -> Option<Job> {
        self.inner.snapshot.borrow().first().cloned()
    }

    pub fn mode(&self) -> PollMode {
        *self.inner.mode.borrow()
    }

    /// Receiver notified on every mode transition.
    pub fn watch_mode(&self) -> watch::Receiver<PollMode> {
        self.inner.mode.subscribe()
    }

    /// Failed queries since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Stop polling. Any in-flight query result is discarded.
    pub fn dispose(&self) {
        if !self.inner.cancel.is_cancelled() {
            tracing::debug!(filter = ?self.inner.filter, "Disposing job tracker");
            self.inner.cancel.cancel();
        }
        self.inner.mode.send_replace(PollMode::Idle);
    }

    /// Dispose and wait up to 5 seconds for the poll task to exit.
    pub async fn shutdown(mut self) {
        self.dispose();
        if let Some(task) = self.task.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), task).await;
        }
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    /// Blocking entry into the single-flight path.
    async fn query(&self) -> Result<Snapshot, TrackerError> {
        if self.cancel.is_cancelled() {
            return Err(TrackerError::Disposed);
        }
        let _guard = self.in_flight.lock().await;
        self.query_locked().await
    }

    /// Timer entry: a no-op while another query is in flight.
    async fn tick(&self) {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!(filter = ?self.filter, "Query in flight, skipping tick");
            return;
        };
        // Failures are logged in query_locked; the loop keeps going.
        let _ = self.query_locked().await;
    }

    /// Must only be called while holding `in_flight`.
    async fn query_locked(&self) -> Result<Snapshot, TrackerError> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Err(TrackerError::Disposed),
            result = self.source.list_jobs(self.filter.as_deref()) => result,
        };

        if self.cancel.is_cancelled() {
            return Err(TrackerError::Disposed);
        }

        match result {
            Ok(jobs) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                // Published as reported; the backend owns the lifecycle.
                for job in jobs.iter().filter(|job| !job.is_consistent()) {
                    tracing::warn!(
                        job_id = %job.id,
                        status = %job.status,
                        has_result = job.result.is_some(),
                        has_error = job.error.is_some(),
                        "Backend reported inconsistent job record",
                    );
                }
                let snapshot = Arc::new(jobs);
                tracing::debug!(
                    filter = ?self.filter,
                    jobs = snapshot.len(),
                    active = job::active_jobs(&snapshot).len(),
                    "Job snapshot updated",
                );
                self.snapshot.send_replace(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    filter = ?self.filter,
                    consecutive_failures = failures,
                    error = %e,
                    "Job query failed, keeping previous snapshot",
                );
                Err(TrackerError::QueryFailed(e))
            }
        }
    }

    fn timer_for(&self, mode: PollMode) -> Interval {
        let period = self.config.interval_for(mode);
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer
    }
}

/// Poll loop: one initial query, then one timer whose period follows the
/// snapshot. Runs until the tracker's token is cancelled.
async fn run_poll_loop(inner: Arc<Inner>) {
    let mut snapshots = inner.snapshot.subscribe();

    tokio::select! {
        _ = inner.cancel.cancelled() => {
            inner.mode.send_replace(PollMode::Idle);
            return;
        }
        _ = inner.tick() => {}
    }

    let mut mode = PollMode::for_jobs(&snapshots.borrow_and_update());
    inner.mode.send_replace(mode);
    let mut timer = inner.timer_for(mode);
    tracing::debug!(filter = ?inner.filter, ?mode, "Job tracker polling");

    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = timer.tick() => inner.tick().await,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if inner.cancel.is_cancelled() {
            break;
        }

        let desired = PollMode::for_jobs(&snapshots.borrow_and_update());
        if desired != mode {
            tracing::debug!(filter = ?inner.filter, from = ?mode, to = ?desired, "Switching poll mode");
            mode = desired;
            inner.mode.send_replace(mode);
            timer = inner.timer_for(mode);
        }
    }

    inner.mode.send_replace(PollMode::Idle);
    tracing::debug!(filter = ?inner.filter, "Job tracker stopped");
}
