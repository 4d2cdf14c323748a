//! Infrastructure layer - Implementations of domain collaborators and services

pub mod api_key;
pub mod codelist;
pub mod events;
pub mod logging;
pub mod observability;
pub mod usage;
