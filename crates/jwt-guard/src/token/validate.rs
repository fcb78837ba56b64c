//! Token validation.
//!
//! Validation checks, in order:
//!
//! 1. Token size (rejected before any parsing)
//! 2. Key usability for the configured algorithm
//! 3. Header algorithm equals the configured algorithm
//! 4. Signature
//! 5. `exp` / `nbf` with the configured leeway, then `aud` / `iss` if configured
//!
//! All failures surface as `ValidationError`, whose client-facing message is
//! generic. The specific cause is logged at debug level.

use super::claims::DecodedToken;
use crate::errors::ValidationError;
use crate::keys::VerificationKey;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;
use tracing::instrument;

/// Algorithm used when none is configured.
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Maximum token size accepted for validation (8KB).
///
/// Typical tokens are well under 1KB. Checked before any base64 decoding or
/// signature work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Parameters for a single validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSettings {
    /// The only algorithm a token header may name.
    pub algorithm: Algorithm,

    /// Tolerance applied to `exp` and `nbf`.
    pub leeway_seconds: u64,

    /// Required `aud` value, if any.
    pub audience: Option<String>,

    /// Required `iss` value, if any.
    pub issuer: Option<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM,
            leeway_seconds: 0,
            audience: None,
            issuer: None,
        }
    }
}

impl ValidationSettings {
    /// Settings for `algorithm` with everything else defaulted.
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Build the `jsonwebtoken` validation for these settings.
    ///
    /// `exp` and `nbf` are checked when present but not required. `aud` and
    /// `iss` become required only when configured.
    pub fn to_validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway_seconds;
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;

        match &self.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        validation
    }
}

/// Verify `token` against `key` and return its claim set.
///
/// # Errors
///
/// Returns the `ValidationError` describing the first failed check.
#[instrument(skip_all, fields(algorithm = ?settings.algorithm))]
pub fn decode_verified(
    token: &str,
    key: &VerificationKey,
    settings: &ValidationSettings,
) -> Result<DecodedToken, ValidationError> {
    // Check token size BEFORE any parsing or cryptographic operations
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "jwt_guard.validate",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(ValidationError::TokenTooLarge);
    }

    let decoding_key = key.decoding_key(settings.algorithm)?;

    let token_data = decode::<DecodedToken>(token, &decoding_key, &settings.to_validation())
        .map_err(|e| {
            let error = ValidationError::from(e);
            tracing::debug!(
                target: "jwt_guard.validate",
                reason = error.kind(),
                "Token verification failed"
            );
            error
        })?;

    Ok(token_data.claims)
}

/// Decode a token's claim set WITHOUT verifying its signature or time claims.
///
/// For inspection and logging only. Never use the result for access decisions.
///
/// # Errors
///
/// Returns `TokenTooLarge` or `Malformed` if the token cannot be decoded.
pub fn decode_unverified(token: &str) -> Result<DecodedToken, ValidationError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        return Err(ValidationError::TokenTooLarge);
    }

    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    decode::<DecodedToken>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(target: "jwt_guard.validate", error = %e, "Failed to decode token");
            ValidationError::Malformed
        })
}

/// Validates a raw token against a verification key.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(
        &self,
        token: &str,
        key: &VerificationKey,
    ) -> Result<DecodedToken, ValidationError>;
}

/// Validator backed by `decode_verified`.
///
/// Settings live behind a lock so the algorithm can be changed while the
/// validator is shared by running middleware.
#[derive(Debug, Default)]
pub struct DefaultTokenValidator {
    settings: RwLock<ValidationSettings>,
}

impl DefaultTokenValidator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        Self::new(ValidationSettings::for_algorithm(algorithm))
    }

    pub async fn algorithm(&self) -> Algorithm {
        self.settings.read().await.algorithm
    }

    /// Change the required algorithm for subsequent validations.
    pub async fn set_algorithm(&self, algorithm: Algorithm) {
        let mut settings = self.settings.write().await;
        if settings.algorithm != algorithm {
            tracing::info!(
                target: "jwt_guard.validate",
                from = ?settings.algorithm,
                to = ?algorithm,
                "Token algorithm changed"
            );
        }
        settings.algorithm = algorithm;
    }

    pub async fn settings(&self) -> ValidationSettings {
        self.settings.read().await.clone()
    }
}

#[async_trait]
impl TokenValidator for DefaultTokenValidator {
    async fn validate(
        &self,
        token: &str,
        key: &VerificationKey,
    ) -> Result<DecodedToken, ValidationError> {
        let settings = self.settings().await;
        decode_verified(token, key, &settings)
    }
}
