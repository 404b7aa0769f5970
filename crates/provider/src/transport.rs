//! HTTP transport for the Anthropic Messages API.
//!
//! Auth: `x-api-key` for raw API keys, `Authorization: Bearer` for OAuth
//! access tokens.

use crate::http_util::ProviderHttp;
use crate::request::RequestBody;
use async_trait::async_trait;
use maxline_types::traits::{ByteStream, Result};
use rquest::Client;

/// Anthropic Messages API endpoint.
pub const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Required Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Beta features to enable; `oauth-2025-04-20` is required for OAuth Bearer
/// tokens.
pub const ANTHROPIC_BETA: &str = "oauth-2025-04-20,prompt-caching-2024-07-31";

/// Authentication mode for the Messages API.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Raw API key sent via `x-api-key` header.
    ApiKey(String),
    /// OAuth access token sent via `Authorization: Bearer` header.
    Bearer(String),
}

/// Opens streaming calls against the inference endpoint.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Open a streaming invocation and return the raw SSE byte stream.
    ///
    /// Each call opens a fresh connection; retries never resume a previous
    /// one.
    async fn open_stream(&self, body: &RequestBody, auth: &AuthMode) -> Result<ByteStream>;
}

/// [`InferenceTransport`] implementation over HTTP.
pub struct HttpInferenceTransport {
    ph: ProviderHttp,
    api_url: String,
}

impl HttpInferenceTransport {
    /// Creates a transport against the production Messages endpoint.
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self {
            ph: ProviderHttp::new(http),
            api_url: API_URL.to_string(),
        }
    }
}

#[async_trait]
impl InferenceTransport for HttpInferenceTransport {
    async fn open_stream(&self, body: &RequestBody, auth: &AuthMode) -> Result<ByteStream> {
        let builder = self
            .ph
            .client()
            .post(&self.api_url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("anthropic-beta", ANTHROPIC_BETA)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream");

        let builder = match auth {
            AuthMode::ApiKey(key) => builder.header("x-api-key", key.as_str()),
            AuthMode::Bearer(token) => builder.header("authorization", format!("Bearer {token}")),
        };

        let resp = self.ph.send(builder.json(body)).await?;
        Ok(ProviderHttp::byte_stream(resp))
    }
}
