//! HTTP request handlers.
//!
//! Handlers read the authentication outcome through the `AuthContext`
//! extractor; the middleware layered on each route decides whether an
//! unauthenticated request gets this far.

use axum::Json;
use jwt_guard::AuthContext;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub message: String,
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: Option<String>,
    pub claims: Map<String, Value>,
}

/// Liveness check.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Reachable without a token.
pub async fn public() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "This endpoint is public".to_string(),
    })
}

/// Greets the caller by subject when a valid token was presented.
///
/// Mounted behind `optional_authentication`, so requests without a token or
/// with an invalid one still arrive here as anonymous.
#[instrument(skip_all, name = "whoami.greeting")]
pub async fn greeting(auth: AuthContext) -> Json<GreetingResponse> {
    let message = match auth.subject() {
        Some(subject) => format!("Hello, {}", subject),
        None if auth.is_authenticated() => "Hello, authenticated caller".to_string(),
        None => "Hello, anonymous".to_string(),
    };

    Json(GreetingResponse {
        message,
        authenticated: auth.is_authenticated(),
    })
}

/// Returns the caller's claims.
///
/// Mounted behind `require_authentication`.
#[instrument(skip_all, name = "whoami.me")]
pub async fn me(auth: AuthContext) -> Json<MeResponse> {
    let claims = auth
        .decoded_token()
        .map(|token| token.claims().clone())
        .unwrap_or_default();

    Json(MeResponse {
        subject: auth.subject().map(str::to_string),
        claims,
    })
}
