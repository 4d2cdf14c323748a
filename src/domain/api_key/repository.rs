//! Credential store trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::ApiKey;
use crate::domain::DomainError;

/// Resolves an opaque key string to the API key it identifies
///
/// Validity (enabled, not expired) is checked by the caller, so stores return
/// disabled and expired keys as-is.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a key by its opaque value
    async fn resolve(&self, key: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Number of keys known to the store
    async fn count(&self) -> Result<usize, DomainError>;
}
