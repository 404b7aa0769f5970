//! OS-keyring secret store.
//!
//! Delegates to the platform credential service: Keychain on macOS,
//! Credential Manager on Windows, Secret Service / kwallet on Linux.
//! Keyring calls are blocking, so each operation runs on the blocking pool.

use async_trait::async_trait;
use keyring::Entry;
use maxline_types::{MaxlineError, SecretStore, traits::Result};

/// Service identifier under which all maxline secrets are namespaced.
pub const SERVICE_NAME: &str = "maxline";

/// A [`SecretStore`] backed by the OS credential service.
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// Creates a store namespaced under [`SERVICE_NAME`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Creates a store namespaced under a custom service identifier.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).map_err(|e| MaxlineError::Storage(e.to_string()))
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| MaxlineError::Storage(format!("keyring task failed: {e}")))?
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = self.entry(key)?;
        let value = value.to_string();
        run_blocking(move || {
            entry
                .set_password(&value)
                .map_err(|e| MaxlineError::Storage(e.to_string()))
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = self.entry(key)?;
        run_blocking(move || match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(MaxlineError::Storage(e.to_string())),
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let entry = self.entry(key)?;
        run_blocking(move || match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(MaxlineError::Storage(e.to_string())),
        })
        .await
    }
}
