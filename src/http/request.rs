//! Upstream dispatch.
//!
//! # Responsibilities
//! - Rewrite the target to `upstream base + path [+ "?" + query]`
//! - Keep the method and stream the inbound body through untouched
//! - Forward sanitized headers
//! - Issue exactly one attempt and classify failures
//!
//! # Design Decisions
//! - Body is passed through as a stream, never buffered
//! - `Host` is left to the HTTP client, which derives it from the target
//! - Connect and response-header deadlines come from config

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::resilience::timeouts::within;
use crate::security::{sanitize_headers, CredentialGate};

pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the pooled client used for every upstream call.
pub fn build_client(connect_timeout: Option<Duration>) -> UpstreamClient {
    // Fails only if a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(connect_timeout);

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(https)
}

/// Upstream address for an inbound URI. An empty query adds no `?`.
pub fn upstream_target(base: &str, uri: &Uri) -> String {
    let path = uri.path();
    let query = uri.query().filter(|q| !q.is_empty());

    let mut target = String::with_capacity(
        base.len() + path.len() + query.map_or(0, |q| q.len() + 1),
    );
    target.push_str(base);
    target.push_str(path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Build the outbound request without sending it.
pub fn build_upstream_request(
    base: &str,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    credential: &HeaderName,
    body: Body,
) -> Result<Request<Body>, ProxyError> {
    let mut builder = Request::builder()
        .method(method.clone())
        .uri(upstream_target(base, uri));

    if let Some(outbound) = builder.headers_mut() {
        *outbound = sanitize_headers(headers, credential);
        outbound.remove(header::HOST);
    }

    Ok(builder.body(body)?)
}

/// Forwards requests to the configured upstream.
#[derive(Clone)]
pub struct UpstreamDispatcher {
    client: UpstreamClient,
    base: String,
    credential: HeaderName,
    response_timeout: Option<Duration>,
}

impl UpstreamDispatcher {
    pub fn new(config: &ProxyConfig, gate: &CredentialGate) -> Self {
        Self {
            client: build_client(config.timeouts.connect()),
            base: config.upstream.base().to_string(),
            credential: gate.header_name().clone(),
            response_timeout: config.timeouts.upstream(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Send one request upstream and wait for its response headers.
    pub async fn dispatch(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<Response<Incoming>, ProxyError> {
        let request =
            build_upstream_request(&self.base, method, uri, headers, &self.credential, body)?;

        let response = within(self.response_timeout, self.client.request(request))
            .await
            .map_err(ProxyError::UpstreamTimeout)??;
        Ok(response)
    }
}
