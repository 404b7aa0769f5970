//! Async traits shared across all maxline crates.
//!
//! Every cross-crate abstraction is defined here so that higher layers depend
//! only on `maxline-types`, not on each other.

use crate::MaxlineError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt as _;
use std::pin::Pin;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MaxlineError>;

/// A pinned, sendable stream of raw response byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A pinned, sendable stream of incremental response text.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Secret key under which the access token is stored.
pub const KEY_ACCESS_TOKEN: &str = "access_token";
/// Secret key under which the refresh token is stored.
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
/// Secret key under which the raw one-time credential is retained for
/// diagnostics.
pub const KEY_OAUTH_TOKEN: &str = "oauth_token";

/// Default retry budget for streaming invocations.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Key-value persistence of named secrets, backed by an encrypted store.
///
/// All keys are namespaced under a fixed service identifier by the
/// implementation. `set` and `delete` on a non-existent key never fail;
/// operations fail only when the underlying store is unavailable. No
/// concurrency control is provided; callers own atomicity.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store (or overwrite) a secret value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Load the secret stored under `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Remove the secret stored under `key`; a no-op if absent.
    async fn delete(&self, key: &str) -> Result<()>;
    /// Return `true` if a secret exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Executes streaming inference invocations against an upstream provider.
#[async_trait]
pub trait InvocationClient: Send + Sync {
    /// Open a streaming invocation and return a lazy, forward-only sequence
    /// of text increments in arrival order.
    ///
    /// Throttling failures at open are retried internally with exponential
    /// backoff, up to `max_retries` total attempts; every other failure
    /// propagates immediately.
    async fn invoke_streaming(
        &self,
        prompt: &str,
        system_context: Option<&str>,
        max_retries: u32,
    ) -> Result<TextStream>;

    /// Invoke the model and return the complete concatenated response.
    async fn invoke(&self, prompt: &str, system_context: Option<&str>) -> Result<String> {
        let mut stream = self
            .invoke_streaming(prompt, system_context, DEFAULT_MAX_RETRIES)
            .await?;
        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            out.push_str(&chunk?);
        }
        Ok(out)
    }

    /// Send a minimal probe request and check the response looks sane.
    async fn validate_connection(&self) -> Result<bool>;
}
