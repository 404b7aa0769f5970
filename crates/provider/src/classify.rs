//! Provider error classification and retry state.
//!
//! The retry decision is a pure function of the error, independent of the
//! I/O loop that acts on it. Backoff before attempt *n* (0-indexed) is
//! `2^n` seconds, uncapped; the caller-supplied budget bounds total
//! attempts.

use maxline_types::MaxlineError;
use std::time::Duration;

/// Failure classes assigned from the provider's error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate-limit or overload condition; retryable with backoff.
    Throttling,
    /// Malformed or semantically invalid request; never retried.
    Validation,
    /// Unknown model identifier; never retried.
    NotFound,
    /// Everything else; never retried.
    Other,
}

impl ErrorClass {
    /// Classify an error from the inference endpoint.
    #[must_use]
    pub fn of(error: &MaxlineError) -> Self {
        match error {
            MaxlineError::Upstream { status, body } => Self::of_upstream(*status, body),
            _ => Self::Other,
        }
    }

    fn of_upstream(status: u16, body: &str) -> Self {
        // The provider-assigned error type wins over the raw status code.
        match error_type(body).as_deref() {
            Some("rate_limit_error" | "overloaded_error") => Self::Throttling,
            Some("invalid_request_error") => Self::Validation,
            Some("not_found_error") => Self::NotFound,
            _ => match status {
                429 | 529 => Self::Throttling,
                400 => Self::Validation,
                404 => Self::NotFound,
                _ => Self::Other,
            },
        }
    }
}

/// Extract the `error.type` field from an upstream error body.
#[must_use]
pub fn error_type(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/type")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}

/// Extract the `error.message` field from an upstream error body.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}

/// Human-readable detail for a fatal upstream error, preferring the
/// provider's message.
#[must_use]
pub fn upstream_detail(error: &MaxlineError) -> String {
    match error {
        MaxlineError::Upstream { status, body } => {
            error_message(body).unwrap_or_else(|| format!("status {status}: {body}"))
        }
        other => other.to_string(),
    }
}

/// Per-invocation retry bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    attempt: u32,
    max_retries: u32,
}

impl RetryState {
    /// Start counting attempts against a caller-supplied budget.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            attempt: 0,
            max_retries,
        }
    }

    /// Whether another attempt fits in the budget.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.attempt + 1 < self.max_retries
    }

    /// Delay before the next attempt: `2^attempt` seconds, uncapped.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(2u64.pow(self.attempt))
    }

    /// Record that the current attempt failed.
    pub const fn advance(&mut self) {
        self.attempt += 1;
    }

    /// Attempts performed so far, counting the one in flight.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }
}
