//! Codelist domain
//!
//! Minimal reference-data model used by the entry endpoints behind the gateway.

mod entity;
mod repository;

pub use entity::{Codelist, CodelistEntry};
pub use repository::CodelistRepository;
