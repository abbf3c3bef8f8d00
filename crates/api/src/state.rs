use std::sync::Arc;

use crate::config::ServerConfig;
use crate::relay::RelayClient;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound client for the backend origin. Holds the connection pool.
    pub relay: RelayClient,
}

impl AppState {
    /// Build state from configuration, creating the relay client.
    ///
    /// Fails only if the HTTP client cannot be initialised (e.g. no TLS
    /// backend available).
    pub fn from_config(config: ServerConfig) -> Result<Self, reqwest::Error> {
        let relay = RelayClient::new(
            config.backend_url.clone(),
            std::time::Duration::from_secs(config.relay_timeout_secs),
        )?;
        Ok(Self {
            config: Arc::new(config),
            relay,
        })
    }
}
