//! Codelist entry service
//!
//! Every committed create, update and delete publishes one change event.

use std::sync::Arc;

use tracing::info;

use crate::domain::change_event::{ChangeEvent, ChangeKind};
use crate::domain::codelist::{Codelist, CodelistEntry, CodelistRepository};
use crate::domain::DomainError;
use crate::infrastructure::events::ChangeEventBus;

/// Request to create or replace an entry
#[derive(Debug, Clone)]
pub struct EntryChange {
    pub code: String,
    pub name: String,
}

/// Codelist entry service
pub struct CodelistService {
    repository: Arc<dyn CodelistRepository>,
    events: ChangeEventBus,
}

impl CodelistService {
    pub fn new(repository: Arc<dyn CodelistRepository>, events: ChangeEventBus) -> Self {
        Self { repository, events }
    }

    /// List entries of a known codelist
    pub async fn list(&self, codelist_code: &str) -> Result<Vec<CodelistEntry>, DomainError> {
        self.codelist(codelist_code).await?;
        self.repository.list_entries(codelist_code).await
    }

    /// Create an entry
    pub async fn create(
        &self,
        codelist_code: &str,
        change: EntryChange,
        actor: &str,
    ) -> Result<CodelistEntry, DomainError> {
        let codelist = self.codelist(codelist_code).await?;
        let entry = CodelistEntry::new(&codelist.code, change.code, change.name)?;
        let created = self.repository.create_entry(entry).await?;

        info!(codelist = %codelist.code, entry_id = %created.id, actor, "Codelist entry created");
        self.publish(&codelist, ChangeKind::Insert, &created, actor);

        Ok(created)
    }

    /// Replace code and name of an entry
    pub async fn update(
        &self,
        codelist_code: &str,
        id: &str,
        change: EntryChange,
        actor: &str,
    ) -> Result<CodelistEntry, DomainError> {
        let codelist = self.codelist(codelist_code).await?;
        let mut entry = self
            .repository
            .get_entry(&codelist.code, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Entry '{}' not found", id)))?;

        entry.rename(change.code, change.name)?;
        let updated = self.repository.update_entry(entry).await?;

        info!(codelist = %codelist.code, entry_id = %updated.id, actor, "Codelist entry updated");
        self.publish(&codelist, ChangeKind::Update, &updated, actor);

        Ok(updated)
    }

    /// Delete an entry
    pub async fn delete(
        &self,
        codelist_code: &str,
        id: &str,
        actor: &str,
    ) -> Result<CodelistEntry, DomainError> {
        let codelist = self.codelist(codelist_code).await?;
        let removed = self
            .repository
            .delete_entry(&codelist.code, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Entry '{}' not found", id)))?;

        info!(codelist = %codelist.code, entry_id = %removed.id, actor, "Codelist entry deleted");
        self.publish(&codelist, ChangeKind::Delete, &removed, actor);

        Ok(removed)
    }

    async fn codelist(&self, code: &str) -> Result<Codelist, DomainError> {
        self.repository
            .find_codelist(code)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Codelist '{}' not found", code)))
    }

    fn publish(&self, codelist: &Codelist, kind: ChangeKind, entry: &CodelistEntry, actor: &str) {
        let event = ChangeEvent::new(&codelist.code, &codelist.name, kind, actor)
            .with_entity(&entry.id, &entry.code, &entry.name);

        self.events.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change_event::{Locale, StreamMessage};
    use crate::infrastructure::codelist::InMemoryCodelistRepository;
    use crate::infrastructure::events::{Subscription, SubscriptionRegistry};
    use std::time::Duration;

    fn setup() -> (CodelistService, SubscriptionRegistry) {
        let repository = Arc::new(InMemoryCodelistRepository::with_codelists(vec![
            Codelist::new("LAND_USE", "Land use"),
        ]));
        let registry = SubscriptionRegistry::new(16, Locale::En);
        let (bus, _handle) = ChangeEventBus::start(registry.clone());

        (CodelistService::new(repository, bus), registry)
    }

    fn change(code: &str, name: &str) -> EntryChange {
        EntryChange {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    async fn next_kind(sub: &mut Subscription) -> (ChangeKind, String) {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(2), sub.recv())
                .await
                .expect("message within timeout")
                .expect("subscription open");

            if let StreamMessage::Change(n) = message {
                return (n.event.change_kind, n.event.entity_code);
            }
        }
    }

    #[tokio::test]
    async fn test_mutations_publish_events() {
        let (service, registry) = setup();
        let mut sub = registry.subscribe();

        let created = service
            .create("LAND_USE", change("7", "Residential"), "alice")
            .await
            .unwrap();
        service
            .update("LAND_USE", &created.id, change("7", "Housing"), "alice")
            .await
            .unwrap();
        service.delete("LAND_USE", &created.id, "alice").await.unwrap();

        assert_eq!(next_kind(&mut sub).await, (ChangeKind::Insert, "7".to_string()));
        assert_eq!(next_kind(&mut sub).await, (ChangeKind::Update, "7".to_string()));
        assert_eq!(next_kind(&mut sub).await, (ChangeKind::Delete, "7".to_string()));
    }

    #[tokio::test]
    async fn test_failed_mutation_publishes_nothing() {
        let (service, registry) = setup();
        let mut sub = registry.subscribe();

        let err = service
            .create("LAND_USE", change("", "Nameless"), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(sub.try_recv(), Some(StreamMessage::Connected { .. })));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_unknown_codelist() {
        let (service, _registry) = setup();

        let err = service.list("NOPE").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
