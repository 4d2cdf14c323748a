//! In-memory codelist repository

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::codelist::{Codelist, CodelistEntry, CodelistRepository};
use crate::domain::DomainError;

/// In-memory codelist storage; entries are keyed by codelist code, then entry id
#[derive(Debug, Default)]
pub struct InMemoryCodelistRepository {
    codelists: RwLock<HashMap<String, Codelist>>,
    entries: RwLock<HashMap<String, HashMap<String, CodelistEntry>>>,
}

impl InMemoryCodelistRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository knowing the given codelists
    pub fn with_codelists(codelists: Vec<Codelist>) -> Self {
        let map = codelists
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();

        Self {
            codelists: RwLock::new(map),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CodelistRepository for InMemoryCodelistRepository {
    async fn find_codelist(&self, code: &str) -> Result<Option<Codelist>, DomainError> {
        Ok(self.codelists.read().await.get(code).cloned())
    }

    async fn list_entries(&self, codelist_code: &str) -> Result<Vec<CodelistEntry>, DomainError> {
        let entries = self.entries.read().await;

        let mut result: Vec<CodelistEntry> = entries
            .get(codelist_code)
            .map(|e| e.values().cloned().collect())
            .unwrap_or_default();
        result.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(result)
    }

    async fn get_entry(
        &self,
        codelist_code: &str,
        id: &str,
    ) -> Result<Option<CodelistEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries.get(codelist_code).and_then(|e| e.get(id)).cloned())
    }

    async fn create_entry(&self, entry: CodelistEntry) -> Result<CodelistEntry, DomainError> {
        let mut entries = self.entries.write().await;
        let list = entries.entry(entry.codelist_code.clone()).or_default();

        if list.values().any(|e| e.code == entry.code) {
            return Err(DomainError::conflict(format!(
                "Entry with code '{}' already exists in '{}'",
                entry.code, entry.codelist_code
            )));
        }

        list.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, entry: CodelistEntry) -> Result<CodelistEntry, DomainError> {
        let mut entries = self.entries.write().await;
        let list = entries.get_mut(&entry.codelist_code).ok_or_else(|| {
            DomainError::not_found(format!("Entry '{}' not found", entry.id))
        })?;

        if !list.contains_key(&entry.id) {
            return Err(DomainError::not_found(format!("Entry '{}' not found", entry.id)));
        }

        if list.values().any(|e| e.code == entry.code && e.id != entry.id) {
            return Err(DomainError::conflict(format!(
                "Entry with code '{}' already exists in '{}'",
                entry.code, entry.codelist_code
            )));
        }

        list.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn delete_entry(
        &self,
        codelist_code: &str,
        id: &str,
    ) -> Result<Option<CodelistEntry>, DomainError> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(codelist_code).and_then(|e| e.remove(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_list_sorted() {
        let repo = InMemoryCodelistRepository::new();
        repo.create_entry(CodelistEntry::new("LAND_USE", "9", "Industrial").unwrap())
            .await
            .unwrap();
        repo.create_entry(CodelistEntry::new("LAND_USE", "7", "Residential").unwrap())
            .await
            .unwrap();

        let codes: Vec<_> = repo
            .list_entries("LAND_USE")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.code)
            .collect();
        assert_eq!(codes, vec!["7", "9"]);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let repo = InMemoryCodelistRepository::new();
        repo.create_entry(CodelistEntry::new("LAND_USE", "7", "Residential").unwrap())
            .await
            .unwrap();

        let err = repo
            .create_entry(CodelistEntry::new("LAND_USE", "7", "Other").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_entry() {
        let repo = InMemoryCodelistRepository::new();
        let entry = CodelistEntry::new("LAND_USE", "7", "Residential").unwrap();

        let err = repo.update_entry(entry).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_entry() {
        let repo = InMemoryCodelistRepository::new();
        let entry = repo
            .create_entry(CodelistEntry::new("LAND_USE", "7", "Residential").unwrap())
            .await
            .unwrap();

        let removed = repo.delete_entry("LAND_USE", &entry.id).await.unwrap();
        assert_eq!(removed.unwrap().code, "7");
        assert!(repo.delete_entry("LAND_USE", &entry.id).await.unwrap().is_none());
    }
}
