//! Credential capability handed to API clients at construction.
//!
//! Clients ask the provider for a bearer token on every request, so a
//! provider backed by a session store sees token refreshes without the
//! client being rebuilt.

/// Supplies the bearer token attached to outgoing requests.
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` to send the request unauthenticated.
    fn bearer_token(&self) -> Option<String>;
}

/// Sends every request without an `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token, e.g. one issued at login for the lifetime of the session.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}
