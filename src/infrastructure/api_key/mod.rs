//! API Key infrastructure implementations
//!
//! This module provides the in-memory credential store, key authentication,
//! and per-key rate limiting.

mod rate_limiter;
mod repository;
mod service;

pub use rate_limiter::{Clock, RateLimitConfig, RateLimiter, SystemClock};
pub use repository::InMemoryCredentialStore;
pub use service::{ApiKeyService, KeyRejection};
