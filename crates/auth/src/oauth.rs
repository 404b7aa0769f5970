//! Token endpoint request builders and response parsing.
//!
//! The one-time credential obtained from the CLI is exchanged as an
//! authorization code; refreshes send the current (single-use) refresh token.

use maxline_types::{MaxlineError, TokenPair, token::ACCESS_TOKEN_LIFETIME_SECS, traits::Result};

/// Token exchange and refresh endpoint.
pub const TOKEN_URL: &str = "https://api.anthropic.com/v1/oauth/token";

/// Token revocation endpoint.
pub const REVOKE_URL: &str = "https://api.anthropic.com/v1/oauth/revoke";

/// Build the JSON body for exchanging a one-time credential for a token pair.
#[must_use]
pub fn build_exchange_request(code: &str) -> serde_json::Value {
    serde_json::json!({
        "grant_type": "authorization_code",
        "code": code,
    })
}

/// Build the JSON body for refreshing with the current refresh token.
#[must_use]
pub fn build_refresh_request(refresh_token: &str) -> serde_json::Value {
    serde_json::json!({
        "grant_type": "refresh_token",
        "refresh_token": refresh_token,
    })
}

/// Build the JSON body for revoking a refresh token.
#[must_use]
pub fn build_revoke_request(refresh_token: &str) -> serde_json::Value {
    serde_json::json!({
        "token": refresh_token,
    })
}

/// Parse the token endpoint JSON response into a [`TokenPair`].
///
/// A usable response carries both a new access token and a new refresh
/// token; `expires_in` falls back to the design access-token lifetime.
///
/// # Errors
///
/// Returns an error if either token field is missing.
pub fn parse_token_response(json: &serde_json::Value) -> Result<TokenPair> {
    let access_token = json
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| MaxlineError::Auth("missing access_token in token response".into()))?;

    let refresh_token = json
        .get("refresh_token")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| MaxlineError::Auth("missing refresh_token in token response".into()))?;

    let expires_in = json
        .get("expires_in")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(ACCESS_TOKEN_LIFETIME_SECS);

    Ok(TokenPair::new(access_token, refresh_token).with_expiry(expires_in))
}
