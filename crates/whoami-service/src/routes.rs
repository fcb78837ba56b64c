//! HTTP routes for the whoami service.

use crate::handlers;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use jwt_guard::{optional_authentication, require_authentication, JwtAuth};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` and `/v1/public` - No authentication
/// - `/v1/greeting` - Optional authentication
/// - `/v1/me` - Required authentication
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(auth: Arc<JwtAuth>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/public", get(handlers::public));

    let optional_routes = Router::new()
        .route("/v1/greeting", get(handlers::greeting))
        .layer(from_fn_with_state(auth.clone(), optional_authentication));

    let protected_routes = Router::new()
        .route("/v1/me", get(handlers::me))
        .layer(from_fn_with_state(auth, require_authentication));

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    public_routes
        .merge(optional_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use jwt_guard::{KeyProvider, KeyRetrievalError, VerificationKey};
    use tower::ServiceExt;

    fn unreachable_keys() -> KeyProvider {
        KeyProvider::new(|| async {
            Err::<VerificationKey, _>(KeyRetrievalError::new("no key server in unit tests"))
        })
    }

    async fn status_of(router: Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_public_routes_skip_authentication() {
        let router = build_routes(Arc::new(JwtAuth::new(unreachable_keys())));

        assert_eq!(status_of(router.clone(), "/health").await, StatusCode::OK);
        assert_eq!(status_of(router, "/v1/public").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let router = build_routes(Arc::new(JwtAuth::new(unreachable_keys())));

        assert_eq!(
            status_of(router, "/v1/me").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_optional_route_without_token() {
        let router = build_routes(Arc::new(JwtAuth::new(unreachable_keys())));

        assert_eq!(status_of(router, "/v1/greeting").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let router = build_routes(Arc::new(JwtAuth::new(unreachable_keys())));

        assert_eq!(status_of(router, "/v1/nope").await, StatusCode::NOT_FOUND);
    }
}
