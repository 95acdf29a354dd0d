//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request counter, latency histogram)
//!     → tracing.rs (per-request spans with correlation IDs)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, credential-gated)
//! ```
//!
//! # Design Decisions
//! - Instrumentation never fails a request
//! - Metrics are cheap (atomic increments)
//! - The aggregate is injected, never global, so tests build fresh ones

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::metrics::{ExchangeRecord, MetricsSink, PrometheusMetrics};
