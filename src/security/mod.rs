//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → credential.rs (shared-secret check, 401 on mismatch)
//!     → headers.rs (strip the credential before forwarding)
//!     → Pass to upstream dispatch
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing header is compared as an empty value
//! - Secret comparison is constant-time
//! - The secret never reaches the upstream or the logs

pub mod credential;
pub mod headers;

pub use credential::CredentialGate;
pub use headers::sanitize_headers;
