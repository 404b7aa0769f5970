//! Streaming invocation client for the Claude Messages API.

use crate::classify::{ErrorClass, RetryState, upstream_detail};
use crate::request::build_request_body;
use crate::sse;
use crate::transport::{AuthMode, HttpInferenceTransport, InferenceTransport};
use async_trait::async_trait;
use maxline_auth::AuthManager;
use maxline_config::Config;
use maxline_types::{
    InvocationClient, MaxlineError,
    traits::{Result, TextStream},
};
use std::sync::Arc;

/// Fixed probe prompt used by connection validation.
const PROBE_PROMPT: &str = "Say 'test' and nothing else.";
const PROBE_MARKER: &str = "test";

/// Client for streaming invocations against the Claude API.
///
/// Authenticates with the configured API key when present, otherwise with an
/// OAuth access token resolved through the [`AuthManager`] on every attempt.
pub struct ClaudeClient {
    config: Config,
    transport: Arc<dyn InferenceTransport>,
    auth: Arc<AuthManager>,
}

impl ClaudeClient {
    /// Creates a client over HTTP with the given configuration.
    #[must_use]
    pub fn new(config: Config, auth: Arc<AuthManager>, http: rquest::Client) -> Self {
        Self::with_transport(config, auth, Arc::new(HttpInferenceTransport::new(http)))
    }

    /// Creates a client over a custom transport.
    #[must_use]
    pub fn with_transport(
        config: Config,
        auth: Arc<AuthManager>,
        transport: Arc<dyn InferenceTransport>,
    ) -> Self {
        Self {
            config,
            transport,
            auth,
        }
    }

    /// Resolves the authentication mode: API key if configured, otherwise a
    /// valid OAuth access token.
    async fn resolve_auth(&self) -> Result<AuthMode> {
        if let Some(key) = &self.config.api_key {
            return Ok(AuthMode::ApiKey(key.clone()));
        }
        let token = self.auth.get_valid_access_token().await?;
        Ok(AuthMode::Bearer(token))
    }
}

#[async_trait]
impl InvocationClient for ClaudeClient {
    async fn invoke_streaming(
        &self,
        prompt: &str,
        system_context: Option<&str>,
        max_retries: u32,
    ) -> Result<TextStream> {
        let body = build_request_body(&self.config, prompt, system_context)?;
        let mut retry = RetryState::new(max_retries);

        loop {
            let auth = self.resolve_auth().await?;
            match self.transport.open_stream(&body, &auth).await {
                Ok(bytes) => return Ok(sse::delta_stream(bytes)),
                Err(err) => match ErrorClass::of(&err) {
                    ErrorClass::Throttling if retry.can_retry() => {
                        tracing::warn!(
                            attempt = retry.attempts_made(),
                            delay = ?retry.backoff(),
                            "throttled by provider, backing off"
                        );
                        tokio::time::sleep(retry.backoff()).await;
                        retry.advance();
                    }
                    ErrorClass::Throttling => {
                        return Err(MaxlineError::Throttling {
                            attempts: retry.attempts_made(),
                        });
                    }
                    ErrorClass::Validation => {
                        return Err(MaxlineError::Validation(upstream_detail(&err)));
                    }
                    ErrorClass::NotFound => {
                        return Err(MaxlineError::Provider(format!(
                            "model not found: {}",
                            self.config.model_id
                        )));
                    }
                    ErrorClass::Other => {
                        return Err(match err {
                            MaxlineError::Http(msg) => MaxlineError::Connection(msg),
                            other @ MaxlineError::Upstream { .. } => {
                                MaxlineError::Provider(upstream_detail(&other))
                            }
                            other => other,
                        });
                    }
                },
            }
        }
    }

    async fn validate_connection(&self) -> Result<bool> {
        let response = self
            .invoke(PROBE_PROMPT, None)
            .await
            .map_err(|e| MaxlineError::Connection(format!("connection validation failed: {e}")))?;
        Ok(response.to_lowercase().contains(PROBE_MARKER))
    }
}
