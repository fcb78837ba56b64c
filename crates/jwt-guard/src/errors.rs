//! jwt-guard error types.
//!
//! Authentication outcomes are split into expected negative outcomes (no
//! token, unusable token, invalid token) and system failures (the verification
//! key could not be retrieved). Both are handled at the middleware boundary.
//!
//! `AuthRejection` maps to HTTP responses via `IntoResponse`. Messages returned
//! to clients are intentionally generic; details are logged server-side.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Realm advertised in `WWW-Authenticate` challenges.
pub const WWW_AUTHENTICATE_REALM: &str = "jwt-guard";

/// Errors raised while pulling a token out of a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The request carried different tokens in different places.
    #[error("Request carried more than one distinct access token")]
    MultipleTokens,

    /// The form body could not be buffered.
    #[error("Request body could not be read: {0}")]
    UnreadableBody(String),
}

/// Errors that can occur during token validation.
///
/// Note: Display messages are intentionally generic to prevent information
/// leakage. The variant is logged at debug level for troubleshooting.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Token size exceeds the maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not a well-formed JWT (structure, base64, JSON).
    #[error("The access token is invalid or expired")]
    Malformed,

    /// Signature does not verify against the verification key.
    #[error("The access token is invalid or expired")]
    InvalidSignature,

    /// `exp` claim is in the past.
    #[error("The access token is invalid or expired")]
    Expired,

    /// `nbf` claim is in the future.
    #[error("The access token is invalid or expired")]
    NotYetValid,

    /// Token header algorithm differs from the configured algorithm.
    #[error("The access token is invalid or expired")]
    AlgorithmMismatch,

    /// Audience, issuer or another required claim did not match.
    #[error("The access token is invalid or expired")]
    ClaimMismatch,

    /// The verification key cannot be used with the configured algorithm.
    #[error("The access token is invalid or expired")]
    InvalidKey,
}

impl ValidationError {
    /// Bounded label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::TokenTooLarge => "token_too_large",
            ValidationError::Malformed => "malformed",
            ValidationError::InvalidSignature => "invalid_signature",
            ValidationError::Expired => "expired",
            ValidationError::NotYetValid => "not_yet_valid",
            ValidationError::AlgorithmMismatch => "algorithm_mismatch",
            ValidationError::ClaimMismatch => "claim_mismatch",
            ValidationError::InvalidKey => "invalid_key",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => ValidationError::InvalidSignature,
            ErrorKind::ExpiredSignature => ValidationError::Expired,
            ErrorKind::ImmatureSignature => ValidationError::NotYetValid,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                ValidationError::AlgorithmMismatch
            }
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => ValidationError::ClaimMismatch,
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm => ValidationError::InvalidKey,
            _ => ValidationError::Malformed,
        }
    }
}

/// The verification key could not be produced.
///
/// This is a system-level failure, distinct from a caller presenting a bad
/// or missing token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Verification key retrieval failed: {0}")]
pub struct KeyRetrievalError(pub String);

impl KeyRetrievalError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Why an authentication attempt did not produce a decoded token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("No access token present")]
    NoTokenPresent,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    TokenValidation(#[from] ValidationError),

    #[error(transparent)]
    KeyRetrieval(#[from] KeyRetrievalError),
}

impl AuthFailure {
    /// True when authentication status could not be determined at all.
    pub fn is_system_failure(&self) -> bool {
        matches!(self, AuthFailure::KeyRetrieval(_))
    }

    /// Bounded label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthFailure::NoTokenPresent => "no_token",
            AuthFailure::Extraction(_) => "extraction_error",
            AuthFailure::TokenValidation(_) => "invalid_token",
            AuthFailure::KeyRetrieval(_) => "key_retrieval_error",
        }
    }
}

/// HTTP rejection produced by the default failure handlers.
///
/// Maps to status codes:
/// - MissingToken, InvalidToken, Unverifiable: 401 Unauthorized (with
///   `WWW-Authenticate`)
/// - ServiceUnavailable: 503 Service Unavailable
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("Missing access token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// A token was presented but no key was available to check it. The
    /// challenge carries no `error` attribute since the token itself was not
    /// found to be invalid.
    #[error("Token could not be verified: {0}")]
    Unverifiable(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl AuthRejection {
    /// Returns the HTTP status code for this rejection.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthRejection::MissingToken
            | AuthRejection::InvalidToken(_)
            | AuthRejection::Unverifiable(_) => 401,
            AuthRejection::ServiceUnavailable(_) => 503,
            AuthRejection::Internal => 500,
        }
    }

    fn challenge(&self) -> Option<String> {
        match self {
            AuthRejection::MissingToken | AuthRejection::Unverifiable(_) => {
                Some(format!("Bearer realm=\"{}\"", WWW_AUTHENTICATE_REALM))
            }
            AuthRejection::InvalidToken(_) => Some(format!(
                "Bearer realm=\"{}\", error=\"invalid_token\"",
                WWW_AUTHENTICATE_REALM
            )),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthRejection::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "MISSING_TOKEN",
                "An access token is required".to_string(),
            ),
            AuthRejection::InvalidToken(reason) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", reason.clone())
            }
            AuthRejection::Unverifiable(reason) => {
                tracing::warn!(target: "jwt_guard.middleware", reason = %reason, "Token could not be verified");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNVERIFIABLE_TOKEN",
                    "The access token could not be verified".to_string(),
                )
            }
            AuthRejection::ServiceUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "jwt_guard.middleware", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            AuthRejection::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let challenge = self.challenge();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if let Some(challenge) = challenge {
            if let Ok(header_value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, header_value);
            }
        }

        response
    }
}
