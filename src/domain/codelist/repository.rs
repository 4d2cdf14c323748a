//! Codelist repository trait

use async_trait::async_trait;

use super::entity::{Codelist, CodelistEntry};
use crate::domain::DomainError;

/// Storage for codelists and their entries
#[async_trait]
pub trait CodelistRepository: Send + Sync {
    /// Get a codelist definition by code
    async fn find_codelist(&self, code: &str) -> Result<Option<Codelist>, DomainError>;

    /// List entries of a codelist, ordered by entry code
    async fn list_entries(&self, codelist_code: &str) -> Result<Vec<CodelistEntry>, DomainError>;

    /// Get a single entry
    async fn get_entry(&self, codelist_code: &str, id: &str)
        -> Result<Option<CodelistEntry>, DomainError>;

    /// Insert a new entry; entry codes are unique within a codelist
    async fn create_entry(&self, entry: CodelistEntry) -> Result<CodelistEntry, DomainError>;

    /// Replace an existing entry
    async fn update_entry(&self, entry: CodelistEntry) -> Result<CodelistEntry, DomainError>;

    /// Remove an entry, returning it if it existed
    async fn delete_entry(
        &self,
        codelist_code: &str,
        id: &str,
    ) -> Result<Option<CodelistEntry>, DomainError>;
}
