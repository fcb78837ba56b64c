//! Failure handlers.
//!
//! A `FailureHandler` turns an `AuthFailure` into the response returned in
//! place of the protected handler. `JwtAuth` holds one for required routes
//! and one for optional routes.

use crate::errors::{AuthFailure, AuthRejection};
use axum::response::{IntoResponse, Response};

/// Builds the response for a failed authentication attempt.
///
/// Plain functions and closures of type `Fn(&AuthFailure) -> Response`
/// implement this trait, so an override can delegate to a default handler.
pub trait FailureHandler: Send + Sync {
    fn on_failure(&self, failure: &AuthFailure) -> Response;
}

impl<F> FailureHandler for F
where
    F: Fn(&AuthFailure) -> Response + Send + Sync,
{
    fn on_failure(&self, failure: &AuthFailure) -> Response {
        (self)(failure)
    }
}

/// Default handler for `require_authentication`: always 401.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectUnauthorized;

impl FailureHandler for RejectUnauthorized {
    fn on_failure(&self, failure: &AuthFailure) -> Response {
        match failure {
            AuthFailure::NoTokenPresent | AuthFailure::Extraction(_) => {
                AuthRejection::MissingToken.into_response()
            }
            AuthFailure::TokenValidation(e) => {
                AuthRejection::InvalidToken(e.to_string()).into_response()
            }
            AuthFailure::KeyRetrieval(e) => {
                AuthRejection::Unverifiable(e.to_string()).into_response()
            }
        }
    }
}

/// Default handler for `optional_authentication`.
///
/// Only system failures reach this handler from the middleware. Key retrieval
/// failures map to 503; anything else falls back to `RejectUnauthorized`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectUnavailable;

impl FailureHandler for RejectUnavailable {
    fn on_failure(&self, failure: &AuthFailure) -> Response {
        match failure {
            AuthFailure::KeyRetrieval(e) => {
                AuthRejection::ServiceUnavailable(e.to_string()).into_response()
            }
            other => RejectUnauthorized.on_failure(other),
        }
    }
}
