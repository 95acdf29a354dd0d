//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, credential gate, metrics endpoint)
//!     → request.rs (build target, sanitize headers, dispatch upstream)
//!     → response.rs (relay status/headers/body, finish exchange record)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::UpstreamDispatcher;
pub use server::{AppState, HttpServer};
