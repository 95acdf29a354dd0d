//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the required secret and upstream address are present
//! - Validate value formats (URL scheme, header name, bind address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("api key must not be empty")]
    MissingApiKey,

    #[error("upstream base url must be set")]
    MissingUpstream,

    #[error("upstream base url `{url}` is invalid: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("credential header `{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("bind address `{0}` must be host:port")]
    InvalidBindAddress(String),

    #[error("metrics path `{0}` must start with '/' and name a single fixed route")]
    InvalidMetricsPath(String),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.api_key.is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    if HeaderName::from_bytes(config.auth.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.auth.header_name.clone(),
        ));
    }

    if let Err(e) = validate_upstream(&config.upstream.base_url) {
        errors.push(e);
    }

    if !is_host_port(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let metrics_path = &config.observability.metrics_path;
    if !metrics_path.starts_with('/')
        || metrics_path.len() < 2
        || metrics_path.contains(['{', '}', '?', '#'])
    {
        errors.push(ValidationError::InvalidMetricsPath(metrics_path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::MissingUpstream);
    }

    let invalid = |reason: &str| ValidationError::InvalidUpstream {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment"));
    }
    Ok(())
}

fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.auth.api_key = "secret123".into();
        config.upstream.base_url = "http://127.0.0.1:11434".into();
        config
    }

    #[test]
    fn accepts_minimal_config() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingApiKey));
        assert!(errors.contains(&ValidationError::MissingUpstream));
        assert!(errors.contains(&ValidationError::InvalidBindAddress("nowhere".into())));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_non_http_upstreams() {
        let mut config = valid_config();
        config.upstream.base_url = "ftp://example.com".into();
        assert!(matches!(
            validate_config(&config).unwrap_err()[0],
            ValidationError::InvalidUpstream { .. }
        ));

        config.upstream.base_url = "http://example.com/?a=b".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_bad_header_and_metrics_path() {
        let mut config = valid_config();
        config.auth.header_name = "bad header".into();
        config.observability.metrics_path = "metrics".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn accepts_hostname_bind_address() {
        let mut config = valid_config();
        config.listener.bind_address = "localhost:9000".into();
        assert!(validate_config(&config).is_ok());
    }
}
