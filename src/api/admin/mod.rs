//! Admin API endpoints for operating the gateway

pub mod rate_limits;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/rate-limits",
            get(rate_limits::get_rate_limits).put(rate_limits::update_rate_limits),
        )
        .route("/rate-limits/reset", post(rate_limits::reset_rate_limits))
}
