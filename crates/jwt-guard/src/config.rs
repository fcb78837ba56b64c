//! Authentication configuration.
//!
//! Configuration is loaded from environment variables, with a `from_vars`
//! entry point that takes a map so tests never touch the process environment.

use crate::keys::DEFAULT_KEY_CACHE_TIMEOUT;
use crate::token::validate::{ValidationSettings, DEFAULT_ALGORITHM};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Maximum allowed leeway for time-based claims (10 minutes).
pub const MAX_LEEWAY_SECONDS: u64 = 600;

/// Authentication configuration.
///
/// | Variable | Default |
/// |---|---|
/// | `JWT_ALGO` | `RS256` |
/// | `VERIFICATION_KEY_CACHE_TIMEOUT` | `300` (seconds) |
/// | `JWT_LEEWAY_SECONDS` | `0` |
/// | `JWT_AUDIENCE` | unset |
/// | `JWT_ISSUER` | unset |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Algorithm tokens must be signed with.
    pub algorithm: Algorithm,

    /// How long a retrieved verification key stays fresh.
    pub key_cache_timeout: Duration,

    /// Leeway in seconds applied to `exp` and `nbf`.
    pub leeway_seconds: u64,

    /// Expected `aud` claim, if any.
    pub audience: Option<String>,

    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM,
            key_cache_timeout: DEFAULT_KEY_CACHE_TIMEOUT,
            leeway_seconds: 0,
            audience: None,
            issuer: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid JWT algorithm configuration: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid verification key cache timeout: {0}")]
    InvalidCacheTimeout(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidLeeway(String),
}

impl AuthConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let algorithm = match vars.get("JWT_ALGO") {
            Some(value) => Algorithm::from_str(value.trim()).map_err(|e| {
                ConfigError::InvalidAlgorithm(format!(
                    "JWT_ALGO must name a supported algorithm, got '{}': {}",
                    value, e
                ))
            })?,
            None => DEFAULT_ALGORITHM,
        };

        let key_cache_timeout = match vars.get("VERIFICATION_KEY_CACHE_TIMEOUT") {
            Some(value) => {
                let seconds: u64 = value.trim().parse().map_err(|e| {
                    ConfigError::InvalidCacheTimeout(format!(
                        "VERIFICATION_KEY_CACHE_TIMEOUT must be a non-negative integer, got '{}': {}",
                        value, e
                    ))
                })?;
                Duration::from_secs(seconds)
            }
            None => DEFAULT_KEY_CACHE_TIMEOUT,
        };

        let leeway_seconds = if let Some(value) = vars.get("JWT_LEEWAY_SECONDS") {
            let seconds: u64 = value.trim().parse().map_err(|e| {
                ConfigError::InvalidLeeway(format!(
                    "JWT_LEEWAY_SECONDS must be a non-negative integer, got '{}': {}",
                    value, e
                ))
            })?;

            if seconds > MAX_LEEWAY_SECONDS {
                return Err(ConfigError::InvalidLeeway(format!(
                    "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                    MAX_LEEWAY_SECONDS, seconds
                )));
            }

            seconds
        } else {
            0
        };

        let audience = non_empty(vars.get("JWT_AUDIENCE"));
        let issuer = non_empty(vars.get("JWT_ISSUER"));

        Ok(AuthConfig {
            algorithm,
            key_cache_timeout,
            leeway_seconds,
            audience,
            issuer,
        })
    }

    /// Validation settings derived from this configuration.
    pub fn validation_settings(&self) -> ValidationSettings {
        ValidationSettings {
            algorithm: self.algorithm,
            leeway_seconds: self.leeway_seconds,
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
