//! API Key domain
//!
//! Credentials presented by external API callers and the identity attached
//! to a request once it has been admitted.

mod entity;
mod repository;

pub use entity::{ApiKey, CallerIdentity, CallerRole, Principal};
#[cfg(test)]
pub use repository::MockCredentialStore;
pub use repository::CredentialStore;
