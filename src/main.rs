//! Authenticating reverse proxy (single upstream)
//!
//! ```text
//!   Client ──▶ credential gate ──▶ header sanitizer ──▶ upstream dispatch ──▶ Upstream
//!     ▲             │ 401                                   │ 500 / 502 / 504
//!     │             ▼                                       ▼
//!     └──────── response relay ◀─────────────────────── upstream response
//!                     │
//!                     ▼
//!           metrics aggregate ──▶ GET /metrics (same credential)
//! ```
//!
//! Configuration comes from the environment (`OLLAMA_PROXY_KEY`, `OLLAMA_URL`),
//! an optional `.env` file, or the equivalent flags; see `--help`.

use api_key_proxy::config::{load_dotenv, Cli};
use api_key_proxy::lifecycle::startup;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();
    startup::run(Cli::parse()).await
}
