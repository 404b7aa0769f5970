//! Unified error type for the maxline workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur across maxline crates.
#[derive(Debug, Error)]
pub enum MaxlineError {
    /// Login or one-time-credential exchange failure (CLI, network, parse).
    #[error("authentication error: {0}")]
    Auth(String),

    /// No usable token is stored; the caller must log in again.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Refresh exchange failed for a reason other than an invalid grant.
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    /// The OS secret store is unavailable or rejected the operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// The inference endpoint could not be reached at all.
    #[error("connection error: {0}")]
    Connection(String),

    /// Retry budget exhausted under repeated throttling.
    #[error("throttled after {attempts} attempts")]
    Throttling { attempts: u32 },

    /// The provider rejected the request as malformed or invalid.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Unclassified provider failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// HTTP transport error (DNS, connect, socket).
    #[error("http error: {0}")]
    Http(String),

    /// The upstream returned a non-success status; classified by the caller.
    #[error("upstream error: status={status}, body={body}")]
    Upstream { status: u16, body: String },

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "rquest")]
impl From<rquest::Error> for MaxlineError {
    fn from(e: rquest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl MaxlineError {
    /// Returns `true` if the error is an upstream authorization rejection
    /// (HTTP 401), the signal for refresh-and-retry-once middleware.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Upstream { status: 401, .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MaxlineError>;
