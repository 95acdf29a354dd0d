//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging in the configured format, then the metrics aggregate
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{load_config, Cli};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, PrometheusMetrics};

/// Run the proxy until a termination signal arrives.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error + Send + Sync>> {
    let fallback_format = cli.log_format.unwrap_or_default();
    let loaded = load_config(cli);

    // Logging needs the resolved format, so it starts after loading; a failed
    // load still gets logged with the CLI's format.
    logging::init(
        loaded
            .as_ref()
            .map_or(fallback_format, |c| c.observability.log_format),
    );
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-key-proxy starting");

    let config = loaded.map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base(),
        credential_header = %config.auth.header_name,
        connect_timeout_secs = config.timeouts.connect_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let metrics = Arc::new(PrometheusMetrics::new()?);

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|e| {
            tracing::error!(
                address = %config.listener.bind_address,
                error = %e,
                "Failed to bind listener"
            );
            e
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = HttpServer::new(config, metrics);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
