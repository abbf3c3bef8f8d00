//! Client-side job tracking for the SheetDesk dashboard.
//!
//! Provides a REST client for the backend job API (normally reached through
//! the relay), a credential capability injected at construction, and
//! [`JobTracker`](tracker::JobTracker): an adaptive poller that keeps the
//! latest job snapshot and switches between a fast and a slow cadence based
//! on whether any job is still in flight.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod tracker;

pub use api::{JobSource, JobsApi, JobsApiError};
pub use config::TrackerConfig;
pub use credentials::{CredentialProvider, NoCredentials, StaticToken};
pub use error::TrackerError;
pub use tracker::{JobTracker, PollMode, Snapshot};
