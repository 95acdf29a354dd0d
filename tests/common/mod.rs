//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_key_proxy::{HttpServer, MetricsSink, ProxyConfig, Shutdown};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SECRET: &str = "secret123";

/// Bind an ephemeral port and serve `app` on it.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Upstream that answers every request with a JSON description of it:
/// `{method, path, query, headers: [[name, value], ...], body}`.
pub async fn start_echo_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let headers: Vec<Value> = headers
                .iter()
                .map(|(k, v)| json!([k.as_str(), v.to_str().unwrap_or_default()]))
                .collect();
            axum::Json(json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query(),
                "headers": headers,
                "body": String::from_utf8_lossy(&body),
            }))
        }
    });
    (serve(app).await, hits)
}

/// Upstream returning a fixed status, content type and body, after `delay`.
pub async fn start_fixed_upstream(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
    delay: Duration,
) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            (status, [("content-type", content_type)], body).into_response()
        }
    });
    (serve(app).await, hits)
}

/// An address nothing listens on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn config_for(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.auth.api_key = SECRET.to_string();
    config.upstream.base_url = format!("http://{}", upstream);
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// In-memory sink that keeps exact counts for assertions.
#[derive(Default)]
pub struct RecordingMetrics {
    outcomes: Mutex<HashMap<(String, String, String), u64>>,
    durations: Mutex<Vec<(String, String, Duration)>>,
}

impl RecordingMetrics {
    pub fn count(&self, method: &str, path: &str, outcome: &str) -> u64 {
        self.outcomes
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string(), outcome.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_outcomes(&self) -> u64 {
        self.outcomes.lock().unwrap().values().sum()
    }

    pub fn observations(&self, method: &str, path: &str) -> usize {
        self.durations
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p, _)| m == method && p == path)
            .count()
    }

    pub fn total_observations(&self) -> usize {
        self.durations.lock().unwrap().len()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record_outcome(&self, method: &str, path: &str, outcome: &str) {
        *self
            .outcomes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string(), outcome.to_string()))
            .or_default() += 1;
    }

    fn observe_duration(&self, method: &str, path: &str, elapsed: Duration) {
        self.durations
            .lock()
            .unwrap()
            .push((method.to_string(), path.to_string(), elapsed));
    }

    fn render(&self) -> String {
        format!("recorded {}\n", self.total_outcomes())
    }
}

/// Proxy router plus the recording sink behind it.
pub fn proxy_app(config: ProxyConfig) -> (Router, Arc<RecordingMetrics>) {
    let metrics = Arc::new(RecordingMetrics::default());
    let server = HttpServer::new(config, metrics.clone());
    (server.router(), metrics)
}

/// Drive one request through `app` in-process and collect the whole body.
/// The relayed body is fully consumed, so its exchange is recorded on return.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response: Response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (parts.status, parts.headers, bytes)
}

pub fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

/// Start a full server on an ephemeral port.
pub async fn spawn_proxy(
    config: ProxyConfig,
    metrics: Arc<dyn MetricsSink>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, metrics);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
