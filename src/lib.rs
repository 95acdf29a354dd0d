//! Authenticating reverse proxy library.
//!
//! Every inbound request passes one linear pipeline: credential check,
//! header sanitization, upstream dispatch, response relay, metrics.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{MetricsSink, PrometheusMetrics};
