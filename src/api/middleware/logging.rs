//! Request logging and HTTP metrics middleware with credential redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderName, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::api::state::AppState;
use crate::infrastructure::observability::record_http_request;

/// Log each request and its outcome and record HTTP metrics.
///
/// No span is opened here; `TraceLayer` already owns the request span.
pub async fn logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);
    let headers_log = redact_headers(&request, &state.gateway.credential_header);

    info!(
        method = %method,
        path = %path,
        headers = %headers_log,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    record_http_request(method.as_str(), &path, status, duration);

    info!(
        method = %method,
        path = %path,
        status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Render the loggable headers, masking credentials
fn redact_headers(request: &Request<Body>, credential_header: &HeaderName) -> String {
    request
        .headers()
        .iter()
        .filter(|(name, _)| name == &credential_header || should_log_header(name.as_str()))
        .map(|(name, value)| {
            let value = if name == credential_header || is_sensitive_header(name.as_str()) {
                "[REDACTED]"
            } else {
                value.to_str().unwrap_or("[invalid]")
            };
            format!("{}={}", name, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "x-api-key" | "x-admin-token" | "cookie" | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
            | "x-api-key"
            | "x-admin-token"
    )
}
