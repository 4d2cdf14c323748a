//! Codelist entry endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{negotiated, requested_format, xml::element, ApiError, Json, ToXml};
use crate::domain::{CallerIdentity, CodelistEntry};
use crate::infrastructure::codelist::EntryChange;

/// Body of create and update calls
#[derive(Debug, Deserialize)]
pub struct EntryPayload {
    pub code: String,
    pub name: String,
}

impl From<EntryPayload> for EntryChange {
    fn from(payload: EntryPayload) -> Self {
        Self {
            code: payload.code,
            name: payload.name,
        }
    }
}

/// Entries of one codelist
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct EntryList(pub Vec<CodelistEntry>);

impl ToXml for CodelistEntry {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<entry>");
        element(out, "id", &self.id);
        element(out, "codelistCode", &self.codelist_code);
        element(out, "code", &self.code);
        element(out, "name", &self.name);
        element(out, "updatedAt", &self.updated_at.to_rfc3339());
        out.push_str("</entry>");
    }
}

impl ToXml for EntryList {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<entries>");
        self.0.as_slice().write_xml(out);
        out.push_str("</entries>");
    }
}

/// GET {prefix}/codelists/{codelist}/entries
pub async fn list_entries(
    State(state): State<AppState>,
    Path(codelist): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    debug!(codelist = %codelist, "Listing codelist entries");

    let entries = state.codelist_service.list(&codelist).await?;

    Ok(negotiated(requested_format(&headers), EntryList(entries)))
}

/// POST {prefix}/codelists/{codelist}/entries
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(codelist): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<EntryPayload>,
) -> Result<Response, ApiError> {
    let entry = state
        .codelist_service
        .create(&codelist, payload.into(), caller.principal.as_str())
        .await?;

    let mut response = negotiated(requested_format(&headers), entry);
    *response.status_mut() = StatusCode::CREATED;
    Ok(response)
}

/// PUT {prefix}/codelists/{codelist}/entries/{id}
pub async fn update_entry(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((codelist, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<EntryPayload>,
) -> Result<Response, ApiError> {
    let entry = state
        .codelist_service
        .update(&codelist, &id, payload.into(), caller.principal.as_str())
        .await?;

    Ok(negotiated(requested_format(&headers), entry))
}

/// DELETE {prefix}/codelists/{codelist}/entries/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((codelist, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .codelist_service
        .delete(&codelist, &id, caller.principal.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
