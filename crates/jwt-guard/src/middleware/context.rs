//! Per-request authentication context.

use crate::errors::AuthRejection;
use crate::token::{DecodedToken, RawToken};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::fmt;

/// Authentication result for one request.
///
/// Inserted into request extensions by `require_authentication` and
/// `optional_authentication`. `decoded_token` is only present when the token
/// validated.
#[derive(Clone, Default)]
pub struct AuthContext {
    authenticated: bool,
    raw_token: Option<RawToken>,
    json_token: Option<DecodedToken>,
}

impl AuthContext {
    pub fn authenticated(raw_token: RawToken, json_token: DecodedToken) -> Self {
        Self {
            authenticated: true,
            raw_token: Some(raw_token),
            json_token: Some(json_token),
        }
    }

    /// Context for a request whose token was absent or did not validate.
    pub fn unauthenticated(raw_token: Option<RawToken>) -> Self {
        Self {
            authenticated: false,
            raw_token,
            json_token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The token as extracted, whether or not it validated.
    pub fn raw_token(&self) -> Option<&str> {
        self.raw_token.as_deref()
    }

    pub fn decoded_token(&self) -> Option<&DecodedToken> {
        self.json_token.as_ref()
    }

    /// The `sub` claim of a validated token.
    pub fn subject(&self) -> Option<&str> {
        self.json_token.as_ref().and_then(DecodedToken::subject)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("authenticated", &self.authenticated)
            .field("raw_token", &self.raw_token.as_ref().map(|_| "[REDACTED]"))
            .field("json_token", &self.json_token)
            .finish()
    }
}

/// Handlers behind either middleware can take `AuthContext` as an argument.
///
/// Rejects with 500 if no middleware ran for the route, which is a wiring bug.
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthContext>().cloned().ok_or_else(|| {
            tracing::error!(
                target: "jwt_guard.middleware",
                "AuthContext requested on a route without authentication middleware"
            );
            AuthRejection::Internal
        })
    }
}

/// Extension trait for reading the context from a request.
pub trait AuthContextExt {
    /// Returns `None` if no authentication middleware was applied.
    fn auth_context(&self) -> Option<&AuthContext>;
}

impl<B> AuthContextExt for axum::http::Request<B> {
    fn auth_context(&self) -> Option<&AuthContext> {
        self.extensions().get::<AuthContext>()
    }
}
