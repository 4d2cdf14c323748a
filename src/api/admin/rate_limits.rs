//! Rate limit management endpoints

use std::time::Duration;

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::api_key::RateLimitConfig;

/// Current limiter configuration and state size
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub capacity: u32,
    pub refill_period_secs: u64,
    pub tracked_keys: usize,
}

/// Replacement limiter configuration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRateLimitRequest {
    pub capacity: u32,
    pub refill_period_secs: u64,
}

/// GET /admin/rate-limits
pub async fn get_rate_limits(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Json<RateLimitStatus> {
    Json(status(&state).await)
}

/// PUT /admin/rate-limits
///
/// Replaces capacity and period and drops every bucket, so all keys restart
/// from a full bucket under the new settings.
pub async fn update_rate_limits(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<UpdateRateLimitRequest>,
) -> Result<Json<RateLimitStatus>, ApiError> {
    if request.refill_period_secs == 0 {
        return Err(ApiError::bad_request("refillPeriodSecs must be greater than 0"));
    }

    let config = RateLimitConfig::new(
        request.capacity,
        Duration::from_secs(request.refill_period_secs),
    );
    state.api_key_service.rate_limiter().reconfigure(config).await;

    info!(
        capacity = request.capacity,
        refill_period_secs = request.refill_period_secs,
        "Rate limits reconfigured"
    );

    Ok(Json(status(&state).await))
}

/// POST /admin/rate-limits/reset
pub async fn reset_rate_limits(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Json<RateLimitStatus> {
    let limiter = state.api_key_service.rate_limiter();
    let cleared = limiter.tracked_keys().await;
    limiter.clear_all().await;

    info!(cleared, "Rate limit state reset");

    Json(status(&state).await)
}

async fn status(state: &AppState) -> RateLimitStatus {
    let limiter = state.api_key_service.rate_limiter();
    let config = limiter.config().await;

    RateLimitStatus {
        capacity: config.capacity,
        refill_period_secs: config.refill_period.as_secs(),
        tracked_keys: limiter.tracked_keys().await,
    }
}
