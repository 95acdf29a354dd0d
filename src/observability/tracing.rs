//! Request spans and correlation IDs.
//!
//! # Responsibilities
//! - Tag every request span with a request ID
//! - Reuse an inbound `x-request-id` when the caller supplies one
//!
//! # Design Decisions
//! - The ID lives only in log fields; it is never injected into the
//!   forwarded request or the relayed response

use axum::http::{HeaderMap, Request};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Caller-supplied request ID, or a fresh UUID v4.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Span factory for `TraceLayer`.
pub fn make_request_span<B>(request: &Request<B>) -> ::tracing::Span {
    ::tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request.headers()),
    )
}
