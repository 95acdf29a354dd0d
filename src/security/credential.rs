//! Shared-secret credential gate.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use subtle::ConstantTimeEq;

use crate::config::{AuthConfig, DEFAULT_CREDENTIAL_HEADER};

/// Accepts a request only if its credential header equals the configured secret.
#[derive(Clone)]
pub struct CredentialGate {
    header: HeaderName,
    secret: Arc<[u8]>,
}

impl CredentialGate {
    pub fn new(header: HeaderName, secret: impl AsRef<[u8]>) -> Self {
        Self {
            header,
            secret: Arc::from(secret.as_ref()),
        }
    }

    /// Build from configuration. An unusable header name falls back to
    /// `x-api-key`; loaded configs have already rejected it.
    pub fn from_config(auth: &AuthConfig) -> Self {
        let header = HeaderName::from_bytes(auth.header_name.as_bytes()).unwrap_or_else(|_| {
            tracing::warn!(
                header = %auth.header_name,
                "Invalid credential header name, using default"
            );
            HeaderName::from_static(DEFAULT_CREDENTIAL_HEADER)
        });
        Self::new(header, auth.api_key.as_bytes())
    }

    /// Name of the header carrying the secret.
    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }

    /// Check the first value of the credential header. A missing header is
    /// compared as the empty string.
    pub fn verify(&self, headers: &HeaderMap) -> bool {
        let provided = headers
            .get(&self.header)
            .map_or(&[][..], HeaderValue::as_bytes);
        constant_time_eq(provided, &self.secret)
    }
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("header", &self.header)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Byte equality whose running time does not depend on where inputs differ.
/// Length mismatches return early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
