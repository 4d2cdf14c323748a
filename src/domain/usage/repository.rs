//! Usage sink trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::UsageRecord;
use crate::domain::DomainError;

/// Append-only sink for usage records
///
/// No ordering is guaranteed across concurrent writers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Persist one usage record
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError>;
}
