//! Usage tracking infrastructure implementations

mod in_memory;
mod service;

pub use in_memory::InMemoryUsageRepository;
pub use service::{RecordUsageParams, UsageRecorder};
