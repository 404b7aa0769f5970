//! Remote token endpoint abstraction.
//!
//! [`HttpTokenEndpoint`] talks to the real OAuth endpoints; tests substitute
//! their own [`TokenEndpoint`] implementations.

use crate::oauth;
use async_trait::async_trait;
use maxline_types::{MaxlineError, TokenPair, traits::Result};

/// Exchange, refresh, and revocation calls against the token service.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange a one-time credential for a fresh token pair.
    async fn exchange(&self, code: &str) -> Result<TokenPair>;
    /// Exchange the current refresh token for a rotated token pair.
    ///
    /// An HTTP 401 surfaces as [`MaxlineError::Upstream`] with status 401 so
    /// the caller can distinguish an invalid grant from transient failures.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
    /// Revoke a refresh token server-side.
    async fn revoke(&self, refresh_token: &str) -> Result<()>;
}

/// [`TokenEndpoint`] implementation over HTTP.
pub struct HttpTokenEndpoint {
    http: rquest::Client,
    token_url: String,
    revoke_url: String,
}

impl HttpTokenEndpoint {
    /// Creates an endpoint against the production token service.
    #[must_use]
    pub fn new(http: rquest::Client) -> Self {
        Self {
            http,
            token_url: oauth::TOKEN_URL.to_string(),
            revoke_url: oauth::REVOKE_URL.to_string(),
        }
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<rquest::Response> {
        let resp = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(MaxlineError::Upstream {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    async fn post_token_request(&self, body: &serde_json::Value) -> Result<TokenPair> {
        let json = self
            .post(&self.token_url, body)
            .await?
            .json::<serde_json::Value>()
            .await
            .map_err(MaxlineError::from)?;
        oauth::parse_token_response(&json)
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn exchange(&self, code: &str) -> Result<TokenPair> {
        self.post_token_request(&oauth::build_exchange_request(code))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        self.post_token_request(&oauth::build_refresh_request(refresh_token))
            .await
    }

    async fn revoke(&self, refresh_token: &str) -> Result<()> {
        // Response body is irrelevant; only the status matters.
        self.post(&self.revoke_url, &oauth::build_revoke_request(refresh_token))
            .await?;
        Ok(())
    }
}
