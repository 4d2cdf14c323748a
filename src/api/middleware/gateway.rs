//! Admission gate for the external API
//!
//! Every call under the configured API prefix is authenticated by its
//! credential header, checked against the per-key rate limit, timed, and
//! recorded as exactly one usage record once the downstream handler returns.
//! Calls outside the prefix pass through untouched.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, info_span, Instrument};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{CallerIdentity, ResponseFormat};
use crate::infrastructure::observability::record_gate_rejection;
use crate::infrastructure::usage::RecordUsageParams;

const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const REAL_IP_HEADER: &str = "x-real-ip";

/// Admission gate middleware, installed with `middleware::from_fn_with_state`
pub async fn admission_gate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !state.gateway.is_gated(&path) {
        return next.run(request).await;
    }

    let Some(credential) = extract_credential(request.headers(), &state.gateway.credential_header)
    else {
        debug!(path = %path, "Gated call without credential");
        record_gate_rejection("missing_credential");
        return ApiError::unauthorized("credential required").into_response();
    };

    let api_key = match state.api_key_service.authenticate(&credential).await {
        Ok(Ok(api_key)) => api_key,
        Ok(Err(rejection)) => {
            debug!(path = %path, reason = %rejection, "Credential rejected");
            record_gate_rejection("invalid_credential");
            return ApiError::unauthorized("invalid credential").into_response();
        }
        Err(e) => {
            error!(path = %path, error = %e, "Credential lookup failed");
            record_gate_rejection("lookup_failed");
            return ApiError::internal("credential lookup failed").into_response();
        }
    };

    if !state.api_key_service.try_admit(&api_key).await {
        info!(
            path = %path,
            principal = %api_key.principal(),
            key_prefix = %api_key.key_prefix(),
            "Rate limit exceeded"
        );
        record_gate_rejection("rate_limited");
        return ApiError::rate_limited("rate limit exceeded").into_response();
    }

    let request_id = extract_request_id(request.headers());
    let identity = CallerIdentity::api_caller(&api_key, &request_id);
    let accept = header_str(request.headers(), &header::ACCEPT).map(str::to_string);
    let ip_address = client_ip(&request);
    let user_agent = header_str(request.headers(), &header::USER_AGENT).map(str::to_string);

    let span = info_span!(
        "gated_call",
        request_id = %request_id,
        principal = %identity.principal,
    );
    request.extensions_mut().insert(identity);

    let start = Instant::now();
    let response = next.run(request).instrument(span).await;
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let format = classify_response_format(
        header_str(response.headers(), &header::CONTENT_TYPE),
        accept.as_deref(),
    );
    let status = response.status().as_u16();

    state
        .usage_recorder
        .record(
            RecordUsageParams::new(api_key.key_prefix(), api_key.principal().as_str(), &path)
                .with_client(ip_address, user_agent)
                .with_outcome(status, elapsed_ms, format),
        )
        .await;

    response
}

/// Response representation: outgoing content type first, then the caller's
/// Accept header, then JSON
pub fn classify_response_format(content_type: Option<&str>, accept: Option<&str>) -> ResponseFormat {
    if let Some(content_type) = content_type.filter(|v| !v.trim().is_empty()) {
        return ResponseFormat::from_media_type(content_type).unwrap_or(ResponseFormat::Unknown);
    }

    accept
        .and_then(ResponseFormat::from_accept)
        .unwrap_or(ResponseFormat::Json)
}

/// Credential from the configured header; blank values count as missing
fn extract_credential(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    header_str(headers, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer
fn client_ip(request: &Request<Body>) -> Option<String> {
    let headers = request.headers();

    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get(REAL_IP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded.or(real_ip).map(str::to_string).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
