//! In-memory credential store implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKey, CredentialStore};
use crate::domain::DomainError;

/// In-memory implementation of CredentialStore, keyed by the opaque key value
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    keys: Arc<RwLock<HashMap<String, ApiKey>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial keys; later duplicates replace earlier ones
    pub fn with_keys(keys: Vec<ApiKey>) -> Self {
        let keys_map: HashMap<String, ApiKey> = keys
            .into_iter()
            .map(|k| (k.key().to_string(), k))
            .collect();

        Self {
            keys: Arc::new(RwLock::new(keys_map)),
        }
    }

    /// Add or replace a key
    pub async fn insert(&self, api_key: ApiKey) {
        let mut keys = self.keys.write().await;
        keys.insert(api_key.key().to_string(), api_key);
    }

    /// Remove a key, returning whether it existed
    pub async fn remove(&self, key: &str) -> bool {
        let mut keys = self.keys.write().await;
        keys.remove(key).is_some()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn resolve(&self, key: &str) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(key).cloned())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.keys.read().await.len())
    }
}
