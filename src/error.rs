//! Request-cycle error taxonomy.
//!
//! Every variant is terminal at the handler boundary: it is rendered as a
//! plaintext response, recorded under its outcome label, and never retried.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::plain_text;

/// Failure of a single proxied request cycle.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Credential header absent or not equal to the configured secret.
    #[error("missing or invalid credential")]
    Unauthorized,

    /// The outbound request could not be built (bad method or target).
    #[error("failed to build upstream request: {0}")]
    RequestConstruction(#[from] axum::http::Error),

    /// Connection-level failure reaching the upstream.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[from] hyper_util::client::legacy::Error),

    /// Upstream did not produce response headers within the configured limit.
    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),
}

impl ProxyError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::RequestConstruction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Literal `status` label used in `proxy_requests_total`.
    ///
    /// Locally generated failures are labeled with their numeric code, unlike
    /// relayed upstream responses which carry the reason phrase.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized => "401",
            ProxyError::RequestConstruction(_) => "500",
            ProxyError::UpstreamUnreachable(_) => "502",
            ProxyError::UpstreamTimeout(_) => "504",
        }
    }

    fn body(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized => "Unauthorized\n",
            ProxyError::RequestConstruction(_) => "Internal error\n",
            ProxyError::UpstreamUnreachable(_) => "Bad gateway\n",
            ProxyError::UpstreamTimeout(_) => "Gateway timeout\n",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        plain_text(self.status(), self.body())
    }
}
