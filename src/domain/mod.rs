//! Domain layer - Core entities and collaborator traits

pub mod api_key;
pub mod change_event;
pub mod codelist;
pub mod error;
pub mod usage;

pub use api_key::{ApiKey, CallerIdentity, CallerRole, CredentialStore, Principal};
pub use change_event::{ChangeEvent, ChangeKind, ChangeNotification, Locale, StreamMessage};
pub use codelist::{Codelist, CodelistEntry, CodelistRepository};
pub use error::DomainError;
pub use usage::{ResponseFormat, UsageRecord, UsageRecordId, UsageRepository};
