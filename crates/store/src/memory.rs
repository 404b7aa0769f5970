//! In-memory secret store backed by a `HashMap` behind a `Mutex`.

use async_trait::async_trait;
use maxline_types::{SecretStore, traits::Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory [`SecretStore`] implementation for testing and ephemeral use.
pub struct InMemorySecretStore {
    data: Mutex<HashMap<String, String>>,
}

impl InMemorySecretStore {
    /// Creates a new empty in-memory secret store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}
