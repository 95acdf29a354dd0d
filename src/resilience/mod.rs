//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → connect timeout (HTTP connector)
//!     → timeouts.rs (deadline for response headers)
//!     → On failure: error returned to caller, never retried
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline unless explicitly disabled
//! - One attempt per inbound request; the body stream cannot be replayed

pub mod timeouts;
