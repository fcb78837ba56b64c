//! Authentication middleware.
//!
//! Provides two middleware functions sharing one authentication attempt:
//! - `require_authentication` - the handler only runs for a valid token
//! - `optional_authentication` - the handler runs whether or not a valid token
//!   was presented, unless the verification key could not be obtained
//!
//! Both insert an `AuthContext` into request extensions before running the
//! handler. Use with `axum::middleware::from_fn_with_state` and an
//! `Arc<JwtAuth>` as state.

use super::context::AuthContext;
use super::failure::{FailureHandler, RejectUnauthorized, RejectUnavailable};
use crate::config::AuthConfig;
use crate::errors::{AuthFailure, KeyRetrievalError};
use crate::keys::{KeyProvider, VerificationKey};
use crate::observability::metrics::{
    self, MODE_OPTIONAL, MODE_REQUIRED, OUTCOME_AUTHENTICATED,
};
use crate::token::{
    DecodedToken, DefaultTokenExtractor, DefaultTokenValidator, RawToken, TokenExtractor,
    TokenValidator,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Shared authentication state: the key pipeline plus the pluggable
/// strategies.
///
/// One instance serves every request; wrap it in `Arc` and pass it as
/// middleware state.
pub struct JwtAuth {
    keys: KeyProvider,
    extractor: Arc<dyn TokenExtractor>,
    validator: Arc<dyn TokenValidator>,
    on_requires_failure: Arc<dyn FailureHandler>,
    on_optional_failure: Arc<dyn FailureHandler>,
}

/// Outcome of `JwtAuth::authenticate`.
#[derive(Debug, Clone)]
pub enum AuthAttempt {
    Authenticated {
        raw_token: RawToken,
        claims: DecodedToken,
    },
    Failed {
        /// The extracted token, if extraction got that far.
        raw_token: Option<RawToken>,
        failure: AuthFailure,
    },
}

impl AuthAttempt {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthAttempt::Authenticated { .. })
    }

    pub fn failure(&self) -> Option<&AuthFailure> {
        match self {
            AuthAttempt::Authenticated { .. } => None,
            AuthAttempt::Failed { failure, .. } => Some(failure),
        }
    }

    /// The request context for this attempt.
    pub fn into_context(self) -> AuthContext {
        match self {
            AuthAttempt::Authenticated { raw_token, claims } => {
                AuthContext::authenticated(raw_token, claims)
            }
            AuthAttempt::Failed { raw_token, .. } => AuthContext::unauthenticated(raw_token),
        }
    }

    fn failed(raw_token: Option<RawToken>, failure: impl Into<AuthFailure>) -> Self {
        AuthAttempt::Failed {
            raw_token,
            failure: failure.into(),
        }
    }
}

impl JwtAuth {
    /// Create with the default extractor, validator (RS256) and failure
    /// handlers.
    pub fn new(keys: KeyProvider) -> Self {
        Self {
            keys,
            extractor: Arc::new(DefaultTokenExtractor),
            validator: Arc::new(DefaultTokenValidator::default()),
            on_requires_failure: Arc::new(RejectUnauthorized),
            on_optional_failure: Arc::new(RejectUnavailable),
        }
    }

    /// Create from configuration: cache timeout and validation settings.
    pub fn from_config(config: &AuthConfig, keys: KeyProvider) -> Self {
        let keys = keys.with_cache_timeout(config.key_cache_timeout);
        Self::new(keys).with_validator(DefaultTokenValidator::new(config.validation_settings()))
    }

    /// Replace the token extraction strategy.
    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Replace the token validation strategy.
    pub fn with_validator(mut self, validator: impl TokenValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Replace the failure handler of `require_authentication`.
    pub fn on_requires_authentication_failure(
        mut self,
        handler: impl FailureHandler + 'static,
    ) -> Self {
        self.on_requires_failure = Arc::new(handler);
        self
    }

    /// Replace the failure handler of `optional_authentication`.
    pub fn on_optional_authentication_failure(
        mut self,
        handler: impl FailureHandler + 'static,
    ) -> Self {
        self.on_optional_failure = Arc::new(handler);
        self
    }

    pub fn keys(&self) -> &KeyProvider {
        &self.keys
    }

    /// Pin `key` for the rest of the process lifetime.
    pub async fn set_permanent_verification_key(&self, key: VerificationKey) {
        tracing::info!(target: "jwt_guard.middleware", "Permanent verification key set");
        self.keys.set_permanent_verification_key(key).await;
    }

    /// Return the verification key currently in effect.
    ///
    /// # Errors
    ///
    /// Returns `KeyRetrievalError` if a retrieval was needed and failed.
    pub async fn current_verification_key(&self) -> Result<VerificationKey, KeyRetrievalError> {
        self.keys.current_verification_key().await
    }

    /// Run extraction, then key lookup and validation if a token was found.
    ///
    /// The key pipeline is not consulted for requests without a token.
    #[instrument(skip_all, name = "jwt_guard.middleware.authenticate")]
    pub async fn authenticate(&self, req: &mut Request) -> AuthAttempt {
        let raw_token = match self.extractor.extract(req).await {
            Ok(Some(token)) => token,
            Ok(None) => return AuthAttempt::failed(None, AuthFailure::NoTokenPresent),
            Err(e) => {
                tracing::debug!(target: "jwt_guard.middleware", error = %e, "Token extraction failed");
                return AuthAttempt::failed(None, e);
            }
        };

        let key = match self.keys.current_verification_key().await {
            Ok(key) => key,
            Err(e) => return AuthAttempt::failed(Some(raw_token), e),
        };

        match self.validator.validate(&raw_token, &key).await {
            Ok(claims) => AuthAttempt::Authenticated { raw_token, claims },
            Err(e) => {
                tracing::debug!(target: "jwt_guard.middleware", reason = e.kind(), "Token rejected");
                AuthAttempt::failed(Some(raw_token), e)
            }
        }
    }
}

fn log_failure(mode: &'static str, failure: &AuthFailure) {
    if failure.is_system_failure() {
        tracing::warn!(
            target: "jwt_guard.middleware",
            mode = mode,
            error = %failure,
            "Authentication could not be determined"
        );
    } else {
        tracing::debug!(
            target: "jwt_guard.middleware",
            mode = mode,
            outcome = failure.kind(),
            "Request not authenticated"
        );
    }
}

/// Middleware for routes that require a valid token.
///
/// # Response
///
/// - Runs the handler with an authenticated `AuthContext` if the token is valid
/// - Otherwise returns the requires-failure handler's response (default 401)
#[instrument(skip_all, name = "jwt_guard.middleware.require")]
pub async fn require_authentication(
    State(auth): State<Arc<JwtAuth>>,
    mut req: Request,
    next: Next,
) -> Response {
    match auth.authenticate(&mut req).await {
        AuthAttempt::Authenticated { raw_token, claims } => {
            metrics::record_auth_attempt(MODE_REQUIRED, OUTCOME_AUTHENTICATED);
            req.extensions_mut()
                .insert(AuthContext::authenticated(raw_token, claims));
            next.run(req).await
        }
        AuthAttempt::Failed { failure, .. } => {
            metrics::record_auth_attempt(MODE_REQUIRED, failure.kind());
            log_failure(MODE_REQUIRED, &failure);
            auth.on_requires_failure.on_failure(&failure)
        }
    }
}

/// Middleware for routes that serve both anonymous and authenticated callers.
///
/// # Response
///
/// - Runs the handler with an authenticated `AuthContext` if the token is valid
/// - Runs the handler with an unauthenticated `AuthContext` if no usable token
///   was presented
/// - Returns the optional-failure handler's response (default 503) if the
///   verification key could not be retrieved
#[instrument(skip_all, name = "jwt_guard.middleware.optional")]
pub async fn optional_authentication(
    State(auth): State<Arc<JwtAuth>>,
    mut req: Request,
    next: Next,
) -> Response {
    let attempt = auth.authenticate(&mut req).await;

    let outcome = attempt.failure().map_or(OUTCOME_AUTHENTICATED, AuthFailure::kind);
    metrics::record_auth_attempt(MODE_OPTIONAL, outcome);

    if let Some(failure) = attempt.failure() {
        log_failure(MODE_OPTIONAL, failure);
        if failure.is_system_failure() {
            return auth.on_optional_failure.on_failure(failure);
        }
    }

    req.extensions_mut().insert(attempt.into_context());
    next.run(req).await
}
