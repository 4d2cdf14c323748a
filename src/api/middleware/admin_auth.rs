//! Admin authentication extractor
//!
//! Admin routes require the `X-Admin-Token` header to match the configured
//! token. With no token configured every admin call is rejected.

use axum::{extract::FromRequestParts, http::request::Parts};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor that requires a valid admin token
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            debug!("Admin call rejected: no admin token configured");
            return Err(ApiError::forbidden("admin access disabled"));
        };

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("admin token required"))?;

        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            debug!("Admin call rejected: token mismatch");
            return Err(ApiError::unauthorized("invalid admin token"));
        }

        Ok(RequireAdmin)
    }
}

/// Compare tokens without leaking where they differ or how long the expected one is
fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    let len = provided.len().max(expected.len());

    // Different pad bytes, so a length mismatch can never compare equal
    let mut a = vec![0u8; len];
    let mut b = vec![0xFFu8; len];
    a[..provided.len()].copy_from_slice(provided);
    b[..expected.len()].copy_from_slice(expected);

    let same_len = provided.len().ct_eq(&expected.len());
    let same_bytes = a.as_slice().ct_eq(b.as_slice());

    (same_len & same_bytes).into()
}
