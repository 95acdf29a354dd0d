//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count every request cycle by method, path, and outcome
//! - Observe full-cycle latency of relayed upstream exchanges
//! - Render the aggregate in Prometheus text format
//!
//! # Metrics
//! - `proxy_requests_total` (counter): labels `method`, `path`, `status`
//! - `proxy_request_duration_seconds` (histogram): labels `method`, `path`
//!
//! # Design Decisions
//! - The recorder is owned, not installed globally; each server gets its own
//! - Low-overhead metric updates (atomic operations)
//! - Histogram buckets match the Prometheus client defaults

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use metrics::{Key, KeyName, Label, Level, Metadata, Recorder as _, SharedString};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const REQUESTS_TOTAL: &str = "proxy_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "proxy_request_duration_seconds";

/// Default latency buckets in seconds.
pub const DEFAULT_LATENCY_BUCKETS: [f64; 11] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Destination for per-request instrumentation.
///
/// Implementations must never fail and must be safe under unbounded
/// concurrent use.
pub trait MetricsSink: Send + Sync + 'static {
    /// Count one finished request cycle.
    fn record_outcome(&self, method: &str, path: &str, outcome: &str);

    /// Record the duration of a relayed upstream exchange.
    fn observe_duration(&self, method: &str, path: &str, elapsed: Duration);

    /// Current aggregate in text exposition format.
    fn render(&self) -> String;
}

/// Prometheus-backed aggregate.
pub struct PrometheusMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets(&DEFAULT_LATENCY_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        recorder.describe_counter(
            KeyName::from(REQUESTS_TOTAL),
            None,
            SharedString::from("Total number of requests processed by the proxy"),
        );
        recorder.describe_histogram(
            KeyName::from(REQUEST_DURATION_SECONDS),
            Some(metrics::Unit::Seconds),
            SharedString::from("Duration of proxy requests"),
        );

        Ok(Self { recorder, handle })
    }

    fn metadata() -> Metadata<'static> {
        Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_outcome(&self, method: &str, path: &str, outcome: &str) {
        let key = Key::from_parts(
            REQUESTS_TOTAL,
            vec![
                Label::new("method", method.to_owned()),
                Label::new("path", path.to_owned()),
                Label::new("status", outcome.to_owned()),
            ],
        );
        self.recorder
            .register_counter(&key, &Self::metadata())
            .increment(1);
    }

    fn observe_duration(&self, method: &str, path: &str, elapsed: Duration) {
        let key = Key::from_parts(
            REQUEST_DURATION_SECONDS,
            vec![
                Label::new("method", method.to_owned()),
                Label::new("path", path.to_owned()),
            ],
        );
        self.recorder
            .register_histogram(&key, &Self::metadata())
            .record(elapsed.as_secs_f64());
    }

    fn render(&self) -> String {
        self.handle.render()
    }
}

/// Outcome label for a relayed upstream status: its reason phrase
/// ("OK", "Not Found"), or the bare code when it has none.
pub fn outcome_label(status: StatusCode) -> Cow<'static, str> {
    match reason_phrase(status.as_u16()) {
        Some(reason) => Cow::Borrowed(reason),
        None => Cow::Owned(status.as_u16().to_string()),
    }
}

/// Reason phrases used as outcome labels.
///
/// Label values must stay stable across `http` releases, so 413, 414 and 416
/// keep their RFC 2616 wording instead of `StatusCode::canonical_reason`'s.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",

        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",

        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",

        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",

        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",

        _ => return None,
    };
    Some(phrase)
}

/// One upstream exchange being relayed to the caller.
///
/// Dropping the record finishes the cycle: it logs the exchange and records
/// the counter and duration exactly once. Dropping happens when the relayed
/// body ends, fails, or is abandoned by a disconnecting caller.
pub struct ExchangeRecord {
    sink: Arc<dyn MetricsSink>,
    method: Method,
    path: String,
    status: StatusCode,
    started: Instant,
}

impl ExchangeRecord {
    pub fn new(
        sink: Arc<dyn MetricsSink>,
        method: Method,
        path: String,
        status: StatusCode,
        started: Instant,
    ) -> Self {
        Self {
            sink,
            method,
            path,
            status,
            started,
        }
    }
}

impl Drop for ExchangeRecord {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        tracing::info!(
            method = %self.method,
            path = %self.path,
            status = self.status.as_u16(),
            duration_secs = elapsed.as_secs_f64(),
            "Request completed"
        );
        self.sink
            .record_outcome(self.method.as_str(), &self.path, &outcome_label(self.status));
        self.sink
            .observe_duration(self.method.as_str(), &self.path, elapsed);
    }
}
