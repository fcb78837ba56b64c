//! In-process router harness for middleware tests.
//!
//! Builds an axum `Router` with one route per middleware, each running an
//! echo handler that returns the request's `AuthContext` and the length of
//! the body it received as JSON. Requests are
//! driven with `tower::ServiceExt::oneshot`, no socket needed.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request, StatusCode},
    middleware::from_fn_with_state,
    response::Response,
    routing::get,
    Json, Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use jwt_guard::{
    optional_authentication, require_authentication, AuthContext, DefaultTokenValidator,
    JwtAuth, KeyProvider,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Path guarded by `require_authentication`.
pub const REQUIRED_PATH: &str = "/required";

/// Path guarded by `optional_authentication` (GET and POST).
pub const OPTIONAL_PATH: &str = "/optional";

/// Router plus a count of echo handler invocations.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    handler_calls: Arc<AtomicUsize>,
}

impl TestApp {
    /// Build the test routes around `auth`.
    pub fn new(auth: Arc<JwtAuth>) -> Self {
        let handler_calls = Arc::new(AtomicUsize::new(0));

        let router = Router::new()
            .route(
                REQUIRED_PATH,
                get(echo)
                    .post(echo)
                    .layer(from_fn_with_state(auth.clone(), require_authentication)),
            )
            .route(
                OPTIONAL_PATH,
                get(echo)
                    .post(echo)
                    .layer(from_fn_with_state(auth, optional_authentication)),
            )
            .with_state(handler_calls.clone());

        Self {
            router,
            handler_calls,
        }
    }

    /// Send `req` and return the status and JSON body (`Value::Null` if the
    /// body is empty or not JSON).
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        send(self.router.clone(), req).await
    }

    /// Send `req` and return the full response, headers included.
    pub async fn respond(&self, req: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("router is infallible")
    }

    /// Number of times a protected handler actually ran.
    pub fn handler_calls(&self) -> usize {
        self.handler_calls.load(Ordering::SeqCst)
    }
}

async fn echo(
    State(calls): State<Arc<AtomicUsize>>,
    ctx: AuthContext,
    body: Bytes,
) -> Json<Value> {
    calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "authenticated": ctx.is_authenticated(),
        "raw_token": ctx.raw_token(),
        "claims": ctx.decoded_token(),
        "body_len": body.len(),
    }))
}

/// `JwtAuth` validating EdDSA tokens, the algorithm of `TestKeypair`.
pub fn eddsa_auth(keys: KeyProvider) -> JwtAuth {
    JwtAuth::new(keys).with_validator(DefaultTokenValidator::with_algorithm(Algorithm::EdDSA))
}

/// Drive `router` with one request.
pub async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(req).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body should be readable")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// GET `uri` without credentials.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// GET `uri` with `Authorization: Bearer <token>`.
pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("valid request")
}

/// POST a form-encoded `body` to `uri`.
pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jwt_guard::VerificationKey;

    #[tokio::test]
    async fn test_optional_route_without_token_runs_handler() {
        let auth = Arc::new(eddsa_auth(KeyProvider::permanent(VerificationKey::from(
            "unused",
        ))));
        let app = TestApp::new(auth);

        let (status, body) = app.send(get_request(OPTIONAL_PATH)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["authenticated"], false);
        assert_eq!(app.handler_calls(), 1);
    }
}
