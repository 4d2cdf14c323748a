//! Shared fixtures for router and handler tests

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, response::Response};

use super::state::AppState;
use crate::domain::{ApiKey, Codelist, Locale};
use crate::infrastructure::api_key::{
    ApiKeyService, InMemoryCredentialStore, RateLimitConfig, RateLimiter,
};
use crate::infrastructure::codelist::{CodelistService, InMemoryCodelistRepository};
use crate::infrastructure::events::{ChangeEventBus, SubscriptionRegistry};
use crate::infrastructure::usage::{InMemoryUsageRepository, UsageRecorder};

pub const VALID_KEY: &str = "k1-valid-key";
pub const ADMIN_TOKEN: &str = "root-token";

pub struct TestApp {
    pub state: AppState,
    pub usage: Arc<InMemoryUsageRepository>,
}

/// State with one valid key, the `LAND_USE` codelist and an admin token
pub fn test_app(capacity: u32) -> TestApp {
    let store = Arc::new(InMemoryCredentialStore::with_keys(vec![ApiKey::new(
        VALID_KEY,
        "survey-bureau",
    )]));
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(
        capacity,
        Duration::from_secs(86400),
    )));
    let usage = Arc::new(InMemoryUsageRepository::default());
    let (events, _) = ChangeEventBus::start(SubscriptionRegistry::new(16, Locale::En));
    let codelists = Arc::new(CodelistService::new(
        Arc::new(InMemoryCodelistRepository::with_codelists(vec![Codelist::new(
            "LAND_USE", "Land use",
        )])),
        events.clone(),
    ));

    let state = AppState::new(
        Arc::new(ApiKeyService::new(store, limiter)),
        UsageRecorder::new(usage.clone()),
        codelists,
        events,
    )
    .with_admin_token(ADMIN_TOKEN);

    TestApp { state, usage }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", VALID_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}
