//! Codelist Gateway
//!
//! Reference-data service core:
//! - Admission gate for the external API (credential check, per-key rate limit, usage records)
//! - Token-bucket rate limiting keyed by credential
//! - Change-notification streaming of codelist entry mutations over Server-Sent Events

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use config::CredentialSeed;
use domain::Codelist;
use infrastructure::{
    api_key::{ApiKeyService, InMemoryCredentialStore, RateLimiter},
    codelist::{CodelistService, InMemoryCodelistRepository},
    events::{ChangeEventBus, SubscriptionRegistry},
    usage::{InMemoryUsageRepository, UsageRecorder},
};
use tracing::{info, warn};

/// Create the application state with custom configuration
///
/// Spawns the change-event dispatcher, so it must run inside a Tokio runtime.
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let keys: Vec<_> = config
        .gateway
        .credentials
        .iter()
        .map(CredentialSeed::to_api_key)
        .collect();

    if keys.is_empty() {
        warn!("No credentials configured; every gated call will be rejected");
    } else {
        info!(count = keys.len(), "Loaded credentials");
    }

    let credential_store = Arc::new(InMemoryCredentialStore::with_keys(keys));
    let rate_limit = config.rate_limit.to_config();
    info!(
        capacity = rate_limit.capacity,
        refill_period_secs = rate_limit.refill_period.as_secs(),
        "Rate limiter configured"
    );
    let api_key_service = Arc::new(ApiKeyService::new(
        credential_store,
        Arc::new(RateLimiter::new(rate_limit)),
    ));

    let usage_recorder = UsageRecorder::new(Arc::new(InMemoryUsageRepository::new(
        config.usage.max_records,
    )));

    let registry = SubscriptionRegistry::new(config.events.subscriber_buffer, config.events.locale);
    let (events, _dispatcher) = ChangeEventBus::start(registry);

    let codelist_service = Arc::new(CodelistService::new(
        Arc::new(InMemoryCodelistRepository::with_codelists(default_codelists())),
        events.clone(),
    ));

    let state = AppState::new(api_key_service, usage_recorder, codelist_service, events)
        .with_config(config)?;

    if state.admin_token.is_none() {
        info!("Admin token not set; admin endpoints are disabled");
    }

    Ok(state)
}

/// Codelists available out of the box
pub fn default_codelists() -> Vec<Codelist> {
    vec![
        Codelist::new("LAND_USE", "Land use"),
        Codelist::new("ADMIN_DIVISION", "Administrative division"),
        Codelist::new("SOIL_TYPE", "Soil type"),
    ]
}
