//! Authenticated-call middleware.
//!
//! Wraps an operation closure with token acquisition: fetch a valid access
//! token, invoke the operation, and on an upstream 401 refresh once and
//! retry once.

use crate::AuthManager;
use maxline_types::traits::Result;

/// Run `op` with a valid access token, refreshing and retrying once if the
/// operation is rejected with an authorization failure.
///
/// # Errors
///
/// Propagates token acquisition failures, the refresh failure, or whatever
/// the final invocation of `op` returns.
pub async fn with_auth<T, F, Fut>(manager: &AuthManager, op: F) -> Result<T>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    let token = manager.get_valid_access_token().await?;
    match op(token).await {
        Err(err) if err.is_unauthorized() => {
            tracing::debug!("operation rejected with 401, refreshing token and retrying once");
            let pair = manager.refresh_access_token().await?;
            op(pair.access_token).await
        }
        other => other,
    }
}
