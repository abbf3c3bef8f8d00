/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Origin every relayed request is forwarded to, without trailing slash.
    pub backend_url: String,
    /// Hard deadline for a single relayed call in seconds (default: `300`).
    pub relay_timeout_secs: u64,
    /// Outer HTTP request timeout in seconds (default: `330`).
    ///
    /// Must stay above `relay_timeout_secs` so the relay can report its own
    /// gateway failure before the middleware cuts the request.
    pub request_timeout_secs: u64,
}

/// Default backend origin for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default relay deadline in seconds.
pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 300;

/// Headroom between the relay deadline and the outer request timeout.
const REQUEST_TIMEOUT_HEADROOM_SECS: u64 = 30;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `BACKEND_URL`          | `http://localhost:8000`    |
    /// | `RELAY_TIMEOUT_SECS`   | `300`                      |
    /// | `REQUEST_TIMEOUT_SECS` | relay timeout + 30         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let backend_url = normalize_origin(
            &std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.into()),
        );

        let relay_timeout_secs: u64 = std::env::var("RELAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_RELAY_TIMEOUT_SECS.to_string())
            .parse()
            .expect("RELAY_TIMEOUT_SECS must be a valid u64");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .map(|v| {
                v.parse()
                    .expect("REQUEST_TIMEOUT_SECS must be a valid u64")
            })
            .unwrap_or(relay_timeout_secs + REQUEST_TIMEOUT_HEADROOM_SECS);

        if request_timeout_secs <= relay_timeout_secs {
            tracing::warn!(
                request_timeout_secs,
                relay_timeout_secs,
                "REQUEST_TIMEOUT_SECS does not exceed RELAY_TIMEOUT_SECS; slow relayed calls will end in 408",
            );
        }

        Self {
            host,
            port,
            cors_origins,
            backend_url,
            relay_timeout_secs,
            request_timeout_secs,
        }
    }
}

/// Trim a single trailing slash so `origin + path` never doubles it.
pub fn normalize_origin(origin: &str) -> String {
    origin.trim().strip_suffix('/').unwrap_or(origin.trim()).to_string()
}
