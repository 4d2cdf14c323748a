//! In-memory usage sink

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::usage::{UsageRecord, UsageRepository};
use crate::domain::DomainError;

/// In-memory usage repository keeping the most recent records
#[derive(Debug)]
pub struct InMemoryUsageRepository {
    records: RwLock<VecDeque<UsageRecord>>,
    max_records: usize,
}

impl InMemoryUsageRepository {
    /// Create a new in-memory usage repository
    pub fn new(max_records: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            max_records,
        }
    }

    /// Snapshot of stored records, oldest first
    pub fn records(&self) -> Result<Vec<UsageRecord>, DomainError> {
        let records = self.records.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(records.iter().cloned().collect())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryUsageRepository {
    fn default() -> Self {
        Self::new(100000)
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        records.push_back(record);
        while records.len() > self.max_records {
            records.pop_front();
        }

        Ok(())
    }
}
