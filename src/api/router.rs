use axum::{middleware, routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::admin;
use super::events;
use super::external;
use super::health;
use super::middleware::{admission_gate, logging_middleware};
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
///
/// Layer order, innermost first: panic recovery, admission gate, request
/// logging, tracing, request id. Panics surface to the gate as 500 responses
/// and are recorded like any other downstream failure.
pub fn create_router(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let api_prefix = state.gateway.api_prefix.clone();

    let router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Gated external API
        .nest(&api_prefix, external::create_external_router())
        // Change stream
        .nest("/events", events::create_events_router())
        // Admin API
        .nest("/admin", admin::create_admin_router())
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(state.clone(), admission_gate))
        .layer(middleware::from_fn_with_state(state.clone(), logging_middleware))
        .with_state(state);

    let router = match metrics {
        Some(metrics) => router.merge(create_metrics_router(metrics)),
        None => router,
    };

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
