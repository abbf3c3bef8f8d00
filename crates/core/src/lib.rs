//! Shared domain types for the SheetDesk relay and job tracker.
//!
//! Holds the backend job record as the client observes it. Both the relay
//! integration tests and the tracker crate depend on these definitions.

pub mod job;
pub mod types;
