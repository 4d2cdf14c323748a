//! Codelist infrastructure implementations

mod in_memory;
mod service;

pub use in_memory::InMemoryCodelistRepository;
pub use service::{CodelistService, EntryChange};
