//! whoami service configuration.
//!
//! Configuration is loaded from environment variables. Permanent key material
//! is redacted in Debug output.

use jwt_guard::{AuthConfig, HttpKeyRetriever, KeyProvider, VerificationKey};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Where the service gets its verification key.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Fetch from a URL, cached for `AuthConfig::key_cache_timeout`.
    Remote(String),

    /// Fixed key material, never refreshed.
    Permanent(VerificationKey),
}

impl KeySource {
    /// Build the key provider for this source.
    pub fn into_provider(self) -> KeyProvider {
        match self {
            KeySource::Remote(url) => KeyProvider::new(HttpKeyRetriever::new(url)),
            KeySource::Permanent(key) => KeyProvider::permanent(key),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
            KeySource::Permanent(_) => f.debug_tuple("Permanent").field(&"[REDACTED]").finish(),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: SocketAddr,

    /// Verification key source.
    pub key_source: KeySource,

    /// Token validation and key caching settings.
    pub auth: AuthConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing verification key source: set VERIFICATION_KEY_URL or VERIFICATION_KEY")]
    MissingKeySource,

    #[error("Conflicting verification key sources: set only one of VERIFICATION_KEY_URL and VERIFICATION_KEY")]
    ConflictingKeySources,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error(transparent)]
    Auth(#[from] jwt_guard::ConfigError),
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_value = vars
            .get("BIND_ADDRESS")
            .map(String::as_str)
            .unwrap_or(DEFAULT_BIND_ADDRESS);
        let bind_address: SocketAddr = bind_value.parse().map_err(|e| {
            ConfigError::InvalidBindAddress(format!(
                "BIND_ADDRESS must be host:port, got '{}': {}",
                bind_value, e
            ))
        })?;

        let key_url = non_empty(vars.get("VERIFICATION_KEY_URL"));
        let key_material = non_empty(vars.get("VERIFICATION_KEY"));

        let key_source = match (key_url, key_material) {
            (Some(url), None) => KeySource::Remote(url),
            (None, Some(material)) => KeySource::Permanent(VerificationKey::from(material)),
            (None, None) => return Err(ConfigError::MissingKeySource),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingKeySources),
        };

        let auth = AuthConfig::from_vars(vars)?;

        Ok(Self {
            bind_address,
            key_source,
            auth,
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}
