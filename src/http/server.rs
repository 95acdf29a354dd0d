//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and metrics handlers
//! - Wire up middleware (request spans)
//! - Bind server to listener with connect info for audit logging
//! - Run the per-request pipeline:
//!   credential gate → sanitize → dispatch → relay → record

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::UpstreamDispatcher;
use crate::http::response::relay;
use crate::observability::tracing::make_request_span;
use crate::observability::{ExchangeRecord, MetricsSink};
use crate::security::CredentialGate;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: CredentialGate,
    pub dispatcher: Arc<UpstreamDispatcher>,
    pub metrics: Arc<dyn MetricsSink>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and metrics aggregate.
    pub fn new(config: ProxyConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        let gate = CredentialGate::from_config(&config.auth);
        let dispatcher = Arc::new(UpstreamDispatcher::new(&config, &gate));

        let state = AppState {
            gate,
            dispatcher,
            metrics,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config: Arc::new(config),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route(
                &config.observability.metrics_path,
                get(metrics_handler).fallback(proxy_handler),
            )
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn remote_addr<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Proxy handler: authenticate, forward, relay.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if !state.gate.verify(request.headers()) {
        tracing::warn!(
            remote_addr = %remote_addr(&request),
            path = %path,
            "Unauthorized request"
        );
        let err = ProxyError::Unauthorized;
        state
            .metrics
            .record_outcome(method.as_str(), &path, err.outcome_label());
        return err.into_response();
    }

    let (parts, body) = request.into_parts();
    match state
        .dispatcher
        .dispatch(&parts.method, &parts.uri, &parts.headers, body)
        .await
    {
        Ok(upstream) => {
            let record = ExchangeRecord::new(
                state.metrics.clone(),
                method,
                path,
                upstream.status(),
                start_time,
            );
            relay(upstream, record)
        }
        Err(err) => {
            tracing::error!(
                method = %method,
                path = %path,
                upstream = %state.dispatcher.base(),
                error = %err,
                detail = ?err,
                "Upstream request failed"
            );
            state
                .metrics
                .record_outcome(method.as_str(), &path, err.outcome_label());
            err.into_response()
        }
    }
}

/// Serves the metrics aggregate behind the same credential check.
async fn metrics_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if !state.gate.verify(request.headers()) {
        tracing::warn!(
            remote_addr = %remote_addr(&request),
            "Unauthorized request to metrics endpoint"
        );
        return ProxyError::Unauthorized.into_response();
    }

    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
        )],
        state.metrics.render(),
    )
        .into_response()
}
