//! Access/refresh token pair and expiry logic.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Design lifetime of an access token, in seconds (5 minutes).
pub const ACCESS_TOKEN_LIFETIME_SECS: u64 = 300;

/// Design lifetime of a refresh token, in seconds (7 days).
pub const REFRESH_TOKEN_LIFETIME_SECS: u64 = 604_800;

/// An access token is treated as stale this many seconds before expiry.
pub const STALE_MARGIN_SECS: u64 = 60;

/// The unit of authentication state: a short-lived access token paired with
/// a single-use refresh token.
///
/// Both token strings are opaque. `expires_at` is always derived from
/// issuance time plus the provider-declared lifetime, never from token
/// contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which `access_token` becomes invalid.
    pub expires_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

impl TokenPair {
    /// Create a pair expiring [`ACCESS_TOKEN_LIFETIME_SECS`] from now.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: now_secs() + ACCESS_TOKEN_LIFETIME_SECS,
        }
    }

    /// Set the expiry to `expires_in_secs` seconds from now.
    #[must_use]
    pub fn with_expiry(mut self, expires_in_secs: u64) -> Self {
        self.expires_at = now_secs() + expires_in_secs;
        self
    }

    /// Return `true` if both token strings are non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Return `true` if the access token is expired or within
    /// [`STALE_MARGIN_SECS`] of expiry.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(now_secs())
    }

    /// Expiry check against an explicit clock value.
    #[must_use]
    pub fn needs_refresh_at(&self, now: u64) -> bool {
        now + STALE_MARGIN_SECS >= self.expires_at
    }
}
