//! Configuration loading from disk, environment, and command line.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional TOML
//! file, then environment variables / flags.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command line / environment overrides.
#[derive(Debug, Default, Parser)]
#[command(name = "api-key-proxy", version)]
#[command(about = "Authenticating reverse proxy for a single upstream service", long_about = None)]
pub struct Cli {
    /// Optional TOML file with base settings.
    #[arg(long, env = "PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shared secret callers must present.
    #[arg(long, env = "OLLAMA_PROXY_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upstream base address, e.g. http://127.0.0.1:11434
    #[arg(long, env = "OLLAMA_URL")]
    pub upstream_url: Option<String>,

    /// Listen address.
    #[arg(long, env = "PROXY_BIND_ADDRESS")]
    pub bind: Option<String>,

    /// Header carrying the shared secret.
    #[arg(long, env = "PROXY_CREDENTIAL_HEADER")]
    pub credential_header: Option<String>,

    /// Upstream connect timeout in seconds (0 disables).
    #[arg(long, env = "PROXY_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Seconds to wait for upstream response headers (0 disables).
    #[arg(long, env = "PROXY_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Log output format.
    #[arg(long, env = "PROXY_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Path of the metrics endpoint.
    #[arg(long, env = "PROXY_METRICS_PATH")]
    pub metrics_path: Option<String>,
}

impl Cli {
    /// Overlay every provided value onto `config`.
    pub fn apply(self, config: &mut ProxyConfig) {
        if let Some(v) = self.api_key {
            config.auth.api_key = v;
        }
        if let Some(v) = self.upstream_url {
            config.upstream.base_url = v;
        }
        if let Some(v) = self.bind {
            config.listener.bind_address = v;
        }
        if let Some(v) = self.credential_header {
            config.auth.header_name = v;
        }
        if let Some(v) = self.connect_timeout_secs {
            config.timeouts.connect_secs = v;
        }
        if let Some(v) = self.upstream_timeout_secs {
            config.timeouts.upstream_secs = v;
        }
        if let Some(v) = self.log_format {
            config.observability.log_format = v;
        }
        if let Some(v) = self.metrics_path {
            config.observability.metrics_path = v;
        }
    }
}

/// Load `.env` from the working directory or one of its parents into the
/// process environment. Variables already set win; a missing file is ignored.
///
/// Must run before [`Cli`] is parsed so its `env` fallbacks see the values.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Parse a TOML file without validating it.
pub fn load_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Build the final, validated configuration.
pub fn load_config(cli: Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "api-key-proxy",
            "--api-key",
            "secret123",
            "--upstream-url",
            "http://127.0.0.1:11434",
            "--upstream-timeout-secs",
            "0",
        ]);
        let config = load_config(cli).unwrap();

        assert_eq!(config.auth.api_key, "secret123");
        assert_eq!(config.upstream.base(), "http://127.0.0.1:11434");
        assert_eq!(config.timeouts.upstream(), None);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn missing_required_values_fail() {
        let err = load_config(Cli::default()).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.contains(&ValidationError::MissingApiKey));
                assert!(errors.contains(&ValidationError::MissingUpstream));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_values_are_overridden_by_flags() {
        let path = std::env::temp_dir().join(format!("api-key-proxy-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[upstream]\nbase_url = \"http://file-upstream:1\"\n[auth]\napi_key = \"from-file\"\n",
        )
        .unwrap();

        let cli = Cli {
            config: Some(path.clone()),
            api_key: Some("from-flag".into()),
            ..Default::default()
        };
        let config = load_config(cli).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.auth.api_key, "from-flag");
        assert_eq!(config.upstream.base_url, "http://file-upstream:1");
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Default::default()
        };
        assert!(matches!(load_config(cli), Err(ConfigError::Io { .. })));
    }
}
