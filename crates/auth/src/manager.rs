//! Token lifecycle manager.
//!
//! Owns one conceptual session: login, refresh-with-rotation, expiry-aware
//! token retrieval, and logout. The last-issued pair is cached in memory so
//! expiry checks use the provider-declared lifetime; only the token strings
//! themselves are persisted to the secret store.
//!
//! Concurrent refreshes are single-flighted: the cache mutex is held across
//! the whole read-exchange-persist sequence, so two stale callers produce one
//! exchange and the loser reuses the winner's pair.

use crate::endpoint::TokenEndpoint;
use crate::setup_token::CredentialSource;
use maxline_types::{
    MaxlineError, SecretStore, TokenPair,
    traits::{KEY_ACCESS_TOKEN, KEY_OAUTH_TOKEN, KEY_REFRESH_TOKEN, Result},
};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AuthManager {
    store: Arc<dyn SecretStore>,
    endpoint: Arc<dyn TokenEndpoint>,
    source: Arc<dyn CredentialSource>,
    current: Mutex<Option<TokenPair>>,
}

impl AuthManager {
    pub fn new(
        store: Arc<dyn SecretStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        source: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            store,
            endpoint,
            source,
            current: Mutex::new(None),
        }
    }

    /// Convenience constructor wiring the HTTP endpoint and the Claude CLI
    /// credential source.
    #[must_use]
    pub fn over_http(store: Arc<dyn SecretStore>, http: rquest::Client) -> Self {
        Self::new(
            store,
            Arc::new(crate::endpoint::HttpTokenEndpoint::new(http)),
            Arc::new(crate::setup_token::ClaudeCliSource::new()),
        )
    }

    /// Perform login: obtain a one-time credential, exchange it for a token
    /// pair, and persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::Auth`] if the credential command or the
    /// exchange fails, or [`MaxlineError::Storage`] if persistence fails.
    pub async fn login(&self) -> Result<TokenPair> {
        let mut current = self.current.lock().await;

        let code = self.source.obtain().await?;
        let pair = self
            .endpoint
            .exchange(&code)
            .await
            .map_err(|e| MaxlineError::Auth(format!("token exchange failed: {}", detail(&e))))?;

        self.store.set(KEY_ACCESS_TOKEN, &pair.access_token).await?;
        self.store
            .set(KEY_REFRESH_TOKEN, &pair.refresh_token)
            .await?;
        self.store.set(KEY_OAUTH_TOKEN, &code).await?;

        *current = Some(pair.clone());
        Ok(pair)
    }

    /// Exchange the stored refresh token for a rotated pair and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::NotAuthenticated`] if no refresh token is
    /// stored or the server rejects it as invalid (all local tokens are
    /// cleared in that case), [`MaxlineError::TokenRefresh`] on any other
    /// exchange failure.
    pub async fn refresh_access_token(&self) -> Result<TokenPair> {
        let mut current = self.current.lock().await;
        self.refresh_locked(&mut current).await
    }

    /// Return a non-stale access token, refreshing transparently if the
    /// stored one is expired, within the stale margin, or of unknown age
    /// (fresh process).
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::NotAuthenticated`] if no access token is
    /// stored at all, or any refresh failure.
    pub async fn get_valid_access_token(&self) -> Result<String> {
        let mut current = self.current.lock().await;

        if let Some(pair) = current.as_ref()
            && !pair.needs_refresh()
        {
            return Ok(pair.access_token.clone());
        }

        if self.store.get(KEY_ACCESS_TOKEN).await?.is_none() {
            return Err(MaxlineError::NotAuthenticated(
                "no access token stored; log in first".into(),
            ));
        }

        let pair = self.refresh_locked(&mut current).await?;
        Ok(pair.access_token)
    }

    /// Revoke the refresh token server-side (best effort) and clear all
    /// local state.
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::Storage`] only if clearing the local store
    /// fails; revocation failures are logged and swallowed.
    pub async fn logout(&self) -> Result<()> {
        let mut current = self.current.lock().await;

        if let Ok(Some(refresh_token)) = self.store.get(KEY_REFRESH_TOKEN).await
            && let Err(e) = self.endpoint.revoke(&refresh_token).await
        {
            tracing::warn!(error = %e, "token revocation failed; clearing local state anyway");
        }

        self.clear_locked(&mut current).await
    }

    /// Whether an access token is present in the store (it may be expired).
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.store.exists(KEY_ACCESS_TOKEN).await, Ok(true))
    }

    async fn refresh_locked(&self, current: &mut Option<TokenPair>) -> Result<TokenPair> {
        let Some(refresh_token) = self.store.get(KEY_REFRESH_TOKEN).await? else {
            return Err(MaxlineError::NotAuthenticated(
                "no refresh token found; log in again".into(),
            ));
        };

        match self.endpoint.refresh(&refresh_token).await {
            Ok(pair) => {
                // Rotation: the previous refresh token is now invalid
                // server-side, so both values are overwritten unconditionally.
                self.store.set(KEY_ACCESS_TOKEN, &pair.access_token).await?;
                self.store
                    .set(KEY_REFRESH_TOKEN, &pair.refresh_token)
                    .await?;
                *current = Some(pair.clone());
                Ok(pair)
            }
            Err(MaxlineError::Upstream { status: 401, .. }) => {
                // Invalid grant: the session is irrecoverable without a new
                // login.
                self.clear_locked(current).await?;
                Err(MaxlineError::NotAuthenticated(
                    "refresh token expired or revoked; log in again".into(),
                ))
            }
            Err(e) => Err(MaxlineError::TokenRefresh(detail(&e))),
        }
    }

    async fn clear_locked(&self, current: &mut Option<TokenPair>) -> Result<()> {
        self.store.delete(KEY_ACCESS_TOKEN).await?;
        self.store.delete(KEY_REFRESH_TOKEN).await?;
        self.store.delete(KEY_OAUTH_TOKEN).await?;
        *current = None;
        Ok(())
    }
}

/// Human-readable failure detail, preferring the upstream response body.
fn detail(err: &MaxlineError) -> String {
    match err {
        MaxlineError::Upstream { status, body } if !body.is_empty() => {
            format!("status {status}: {body}")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maxline_store::InMemorySecretStore;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    struct MockSource {
        token: String,
    }

    #[async_trait]
    impl CredentialSource for MockSource {
        async fn obtain(&self) -> Result<String> {
            Ok(self.token.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CredentialSource for FailingSource {
        async fn obtain(&self) -> Result<String> {
            Err(MaxlineError::Auth("claude CLI not found".into()))
        }
    }

    #[derive(Default)]
    struct MockEndpoint {
        exchange_responses: StdMutex<VecDeque<Result<TokenPair>>>,
        refresh_responses: StdMutex<VecDeque<Result<TokenPair>>>,
        refresh_calls: StdMutex<Vec<String>>,
        revoke_error: StdMutex<Option<MaxlineError>>,
        revoke_calls: StdMutex<Vec<String>>,
    }

    impl MockEndpoint {
        fn on_exchange(self, result: Result<TokenPair>) -> Self {
            self.exchange_responses.lock().unwrap().push_back(result);
            self
        }

        fn on_refresh(self, result: Result<TokenPair>) -> Self {
            self.refresh_responses.lock().unwrap().push_back(result);
            self
        }

        fn failing_revoke(self, err: MaxlineError) -> Self {
            *self.revoke_error.lock().unwrap() = Some(err);
            self
        }

        fn refresh_calls(&self) -> Vec<String> {
            self.refresh_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenEndpoint for MockEndpoint {
        async fn exchange(&self, _code: &str) -> Result<TokenPair> {
            self.exchange_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MaxlineError::Auth("unexpected exchange".into())))
        }

        async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
            self.refresh_calls
                .lock()
                .unwrap()
                .push(refresh_token.to_string());
            self.refresh_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MaxlineError::TokenRefresh("unexpected refresh".into())))
        }

        async fn revoke(&self, refresh_token: &str) -> Result<()> {
            self.revoke_calls
                .lock()
                .unwrap()
                .push(refresh_token.to_string());
            match self.revoke_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair::new(access, refresh).with_expiry(300)
    }

    fn manager(
        endpoint: Arc<MockEndpoint>,
        source: Arc<dyn CredentialSource>,
    ) -> (AuthManager, Arc<InMemorySecretStore>) {
        let store = Arc::new(InMemorySecretStore::new());
        (
            AuthManager::new(store.clone(), endpoint, source),
            store,
        )
    }

    async fn seed(store: &InMemorySecretStore, access: &str, refresh: &str) {
        store.set(KEY_ACCESS_TOKEN, access).await.unwrap();
        store.set(KEY_REFRESH_TOKEN, refresh).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_persists_all_three_secrets() {
        let endpoint = Arc::new(MockEndpoint::default().on_exchange(Ok(pair("A1", "R1"))));
        let (m, store) = manager(
            endpoint,
            Arc::new(MockSource {
                token: "abc123".into(),
            }),
        );

        let got = m.login().await.unwrap();
        assert_eq!(got.access_token, "A1");
        assert_eq!(
            store.get(KEY_ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("A1")
        );
        assert_eq!(
            store.get(KEY_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("R1")
        );
        assert_eq!(
            store.get(KEY_OAUTH_TOKEN).await.unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn test_login_cli_failure() {
        let endpoint = Arc::new(MockEndpoint::default());
        let (m, store) = manager(endpoint, Arc::new(FailingSource));

        let err = m.login().await.unwrap_err();
        assert!(matches!(err, MaxlineError::Auth(_)));
        assert!(store.get(KEY_ACCESS_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_exchange_failure_carries_provider_message() {
        let endpoint = Arc::new(MockEndpoint::default().on_exchange(Err(
            MaxlineError::Upstream {
                status: 400,
                body: "code already used".into(),
            },
        )));
        let (m, store) = manager(
            endpoint,
            Arc::new(MockSource {
                token: "abc123".into(),
            }),
        );

        let err = m.login().await.unwrap_err();
        assert!(err.to_string().contains("code already used"));
        assert!(store.get(KEY_ACCESS_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_both_tokens() {
        let endpoint = Arc::new(MockEndpoint::default().on_refresh(Ok(pair("A2", "R2"))));
        let (m, store) = manager(endpoint.clone(), Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;

        let got = m.refresh_access_token().await.unwrap();
        assert_eq!(got.access_token, "A2");
        assert_ne!(
            store.get(KEY_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("R1"),
            "refresh token must rotate on every exchange"
        );
        assert_eq!(
            store.get(KEY_ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("A2")
        );
        assert_eq!(endpoint.refresh_calls(), vec!["R1"]);
    }

    #[tokio::test]
    async fn test_refresh_without_stored_token() {
        let endpoint = Arc::new(MockEndpoint::default());
        let (m, _store) = manager(endpoint, Arc::new(FailingSource));

        let err = m.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, MaxlineError::NotAuthenticated(_)));
        assert!(err.to_string().contains("log in"));
    }

    #[tokio::test]
    async fn test_refresh_invalid_grant_clears_all_tokens() {
        let endpoint = Arc::new(MockEndpoint::default().on_refresh(Err(
            MaxlineError::Upstream {
                status: 401,
                body: "invalid_grant".into(),
            },
        )));
        let (m, store) = manager(endpoint, Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;

        let err = m.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, MaxlineError::NotAuthenticated(_)));
        assert!(store.get(KEY_ACCESS_TOKEN).await.unwrap().is_none());
        assert!(store.get(KEY_REFRESH_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_server_error_keeps_tokens() {
        let endpoint = Arc::new(MockEndpoint::default().on_refresh(Err(
            MaxlineError::Upstream {
                status: 503,
                body: "maintenance".into(),
            },
        )));
        let (m, store) = manager(endpoint, Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;

        let err = m.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, MaxlineError::TokenRefresh(_)));
        assert_eq!(
            store.get(KEY_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("R1")
        );
    }

    #[tokio::test]
    async fn test_login_then_rotating_refreshes() {
        // Concrete lifecycle: abc123 -> A1/R1, then A2/R2, then A3/R3.
        // R1 must never be sent again after the first rotation.
        let endpoint = Arc::new(
            MockEndpoint::default()
                .on_exchange(Ok(pair("A1", "R1")))
                .on_refresh(Ok(pair("A2", "R2")))
                .on_refresh(Ok(pair("A3", "R3"))),
        );
        let (m, store) = manager(
            endpoint.clone(),
            Arc::new(MockSource {
                token: "abc123".into(),
            }),
        );

        m.login().await.unwrap();
        m.refresh_access_token().await.unwrap();
        m.refresh_access_token().await.unwrap();

        assert_eq!(endpoint.refresh_calls(), vec!["R1", "R2"]);
        assert_eq!(
            store.get(KEY_ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("A3")
        );
        assert_eq!(
            store.get(KEY_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("R3")
        );
    }

    #[tokio::test]
    async fn test_get_valid_token_fresh_pair_skips_refresh() {
        let endpoint = Arc::new(MockEndpoint::default().on_exchange(Ok(pair("A1", "R1"))));
        let (m, _store) = manager(
            endpoint.clone(),
            Arc::new(MockSource {
                token: "abc123".into(),
            }),
        );

        m.login().await.unwrap();
        let token = m.get_valid_access_token().await.unwrap();
        assert_eq!(token, "A1");
        assert!(endpoint.refresh_calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_valid_token_stale_pair_refreshes() {
        // Exchange yields a pair already inside the stale margin.
        let endpoint = Arc::new(
            MockEndpoint::default()
                .on_exchange(Ok(TokenPair::new("A1", "R1").with_expiry(30)))
                .on_refresh(Ok(pair("A2", "R2"))),
        );
        let (m, _store) = manager(
            endpoint.clone(),
            Arc::new(MockSource {
                token: "abc123".into(),
            }),
        );

        m.login().await.unwrap();
        let token = m.get_valid_access_token().await.unwrap();
        assert_eq!(token, "A2");
        assert_eq!(endpoint.refresh_calls(), vec!["R1"]);
    }

    #[tokio::test]
    async fn test_get_valid_token_fresh_process_refreshes() {
        // Store holds tokens but the manager has no in-memory expiry: the
        // token age is unknown, so it is refreshed before use.
        let endpoint = Arc::new(MockEndpoint::default().on_refresh(Ok(pair("A2", "R2"))));
        let (m, store) = manager(endpoint.clone(), Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;

        let token = m.get_valid_access_token().await.unwrap();
        assert_eq!(token, "A2");
        assert_eq!(endpoint.refresh_calls(), vec!["R1"]);
    }

    #[tokio::test]
    async fn test_get_valid_token_not_authenticated() {
        let endpoint = Arc::new(MockEndpoint::default());
        let (m, _store) = manager(endpoint, Arc::new(FailingSource));

        let err = m.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, MaxlineError::NotAuthenticated(_)));
    }

    #[tokio::test]
    async fn test_concurrent_stale_callers_share_one_refresh() {
        let endpoint = Arc::new(MockEndpoint::default().on_refresh(Ok(pair("A2", "R2"))));
        let (m, store) = manager(endpoint.clone(), Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;
        let m = Arc::new(m);

        let (a, b) = tokio::join!(m.get_valid_access_token(), m.get_valid_access_token());
        assert_eq!(a.unwrap(), "A2");
        assert_eq!(b.unwrap(), "A2");
        assert_eq!(endpoint.refresh_calls(), vec!["R1"]);
    }

    #[tokio::test]
    async fn test_logout_revokes_and_clears() {
        let endpoint = Arc::new(MockEndpoint::default());
        let (m, store) = manager(endpoint.clone(), Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;
        store.set(KEY_OAUTH_TOKEN, "abc123").await.unwrap();

        m.logout().await.unwrap();
        assert_eq!(endpoint.revoke_calls.lock().unwrap().clone(), vec!["R1"]);
        assert!(store.get(KEY_ACCESS_TOKEN).await.unwrap().is_none());
        assert!(store.get(KEY_REFRESH_TOKEN).await.unwrap().is_none());
        assert!(store.get(KEY_OAUTH_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_swallows_revocation_failure() {
        let endpoint = Arc::new(
            MockEndpoint::default().failing_revoke(MaxlineError::Http("connection reset".into())),
        );
        let (m, store) = manager(endpoint, Arc::new(FailingSource));
        seed(&store, "A1", "R1").await;

        m.logout().await.unwrap();
        assert!(store.get(KEY_REFRESH_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_without_tokens() {
        let endpoint = Arc::new(MockEndpoint::default());
        let (m, _store) = manager(endpoint.clone(), Arc::new(FailingSource));

        m.logout().await.unwrap();
        assert!(endpoint.revoke_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_is_authenticated() {
        let endpoint = Arc::new(MockEndpoint::default());
        let (m, store) = manager(endpoint, Arc::new(FailingSource));

        assert!(!m.is_authenticated().await);
        store.set(KEY_ACCESS_TOKEN, "A1").await.unwrap();
        assert!(m.is_authenticated().await);
    }
}
