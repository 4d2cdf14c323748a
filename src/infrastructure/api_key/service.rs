//! API Key service
//!
//! Authenticates opaque keys against the credential store and meters them
//! through the rate limiter.

use std::sync::Arc;

use tracing::debug;

use crate::domain::api_key::{ApiKey, CredentialStore};
use crate::domain::DomainError;

use super::rate_limiter::RateLimiter;

/// Why a presented key was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    Unknown,
    Disabled,
    Expired,
}

impl std::fmt::Display for KeyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Disabled => write!(f, "disabled"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// API Key service used by the admission gate
pub struct ApiKeyService {
    store: Arc<dyn CredentialStore>,
    rate_limiter: Arc<RateLimiter>,
}

impl ApiKeyService {
    /// Create a new API key service
    pub fn new(store: Arc<dyn CredentialStore>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            store,
            rate_limiter,
        }
    }

    /// Resolve a key and check that it is enabled and unexpired
    pub async fn authenticate(&self, key: &str) -> Result<Result<ApiKey, KeyRejection>, DomainError> {
        let prefix: String = key.chars().take(8).collect();
        debug!(key_prefix = %prefix, "Validating API key");

        let Some(api_key) = self.store.resolve(key).await? else {
            debug!(key_prefix = %prefix, "API key not found");
            return Ok(Err(KeyRejection::Unknown));
        };

        if !api_key.enabled() {
            debug!(key_prefix = %prefix, "API key is disabled");
            return Ok(Err(KeyRejection::Disabled));
        }

        if !api_key.is_valid() {
            debug!(key_prefix = %prefix, expires_at = ?api_key.expires_at(), "API key has expired");
            return Ok(Err(KeyRejection::Expired));
        }

        Ok(Ok(api_key))
    }

    /// Consume one request unit for the key
    pub async fn try_admit(&self, api_key: &ApiKey) -> bool {
        self.rate_limiter.try_admit(api_key.key()).await
    }

    /// Number of keys known to the store
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.store.count().await
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }
}
