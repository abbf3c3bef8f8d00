//! Request handlers.
//!
//! Handlers translate axum extractors into relay calls and map failures via
//! [`RelayError`](crate::error::RelayError).

pub mod relay;
