//! External API served behind the admission gate

pub mod codelists;

use axum::{
    routing::{get, put},
    Router,
};

use super::state::AppState;

/// Create the external API router, nested under the configured prefix
pub fn create_external_router() -> Router<AppState> {
    Router::new()
        .route(
            "/codelists/{codelist}/entries",
            get(codelists::list_entries).post(codelists::create_entry),
        )
        .route(
            "/codelists/{codelist}/entries/{id}",
            put(codelists::update_entry).delete(codelists::delete_entry),
        )
}
