//! whoami service end-to-end tests.
//!
//! Spawns the real router on an ephemeral port, configured from variables the
//! same way `main` configures it, with the verification key served by a mock
//! key endpoint.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use jwt_guard::JwtAuth;
use jwt_guard_test_utils::{sign_hmac, TestKeypair, TestTokenBuilder};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use whoami_service::config::ServiceConfig;
use whoami_service::routes::build_routes;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A whoami server bound to `127.0.0.1:0`.
struct TestWhoamiServer {
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestWhoamiServer {
    async fn spawn(pairs: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = ServiceConfig::from_vars(&vars)?;

        let keys = config.key_source.clone().into_provider();
        let auth = Arc::new(JwtAuth::from_config(&config.auth, keys));
        let app = build_routes(auth);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestWhoamiServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

async fn key_server(keypair: &TestKeypair) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pubkey"))
        .respond_with(ResponseTemplate::new(200).set_body_string(keypair.public_key_pem()))
        .mount(&server)
        .await;
    server
}

async fn spawn_with_remote_key(keypair: &TestKeypair) -> (TestWhoamiServer, MockServer) {
    let keys = key_server(keypair).await;
    let key_url = format!("{}/pubkey", keys.uri());
    let server = TestWhoamiServer::spawn(&[
        ("BIND_ADDRESS", "127.0.0.1:0"),
        ("VERIFICATION_KEY_URL", key_url.as_str()),
        ("JWT_ALGO", "EdDSA"),
    ])
    .await
    .unwrap();
    (server, keys)
}

#[tokio::test]
async fn test_health_and_public_need_no_token() -> Result<(), anyhow::Error> {
    let keypair = TestKeypair::new(1);
    let (server, _keys) = spawn_with_remote_key(&keypair).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/health", server.url())).send().await?;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "healthy");

    let response = client
        .get(format!("{}/v1/public", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_me_with_valid_token() -> Result<(), anyhow::Error> {
    let keypair = TestKeypair::new(1);
    let (server, _keys) = spawn_with_remote_key(&keypair).await;
    let token = keypair.sign(
        &TestTokenBuilder::new()
            .for_user("alice")
            .with_claim("role", serde_json::json!("admin"))
            .build(),
    );

    let response = reqwest::Client::new()
        .get(format!("{}/v1/me", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["subject"], "alice");
    assert_eq!(body["claims"]["role"], "admin");

    Ok(())
}

#[tokio::test]
async fn test_me_without_token_is_rejected() -> Result<(), anyhow::Error> {
    let keypair = TestKeypair::new(1);
    let (server, _keys) = spawn_with_remote_key(&keypair).await;

    let response = reqwest::Client::new()
        .get(format!("{}/v1/me", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    let challenge = response
        .headers()
        .get("www-authenticate")
        .and_then(|v| v.to_str().ok());
    assert!(
        challenge.is_some_and(|c| c.starts_with("Bearer")),
        "Expected a Bearer challenge, got {:?}",
        challenge
    );

    Ok(())
}

#[tokio::test]
async fn test_greeting_for_token_query_and_anonymous() -> Result<(), anyhow::Error> {
    let keypair = TestKeypair::new(1);
    let (server, _keys) = spawn_with_remote_key(&keypair).await;
    let client = reqwest::Client::new();
    let token = keypair.sign(&TestTokenBuilder::new().for_user("bob").build());

    let body: serde_json::Value = client
        .get(format!("{}/v1/greeting?access_token={}", server.url(), token))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["message"], "Hello, bob");
    assert_eq!(body["authenticated"], true);

    let body: serde_json::Value = client
        .get(format!("{}/v1/greeting", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["message"], "Hello, anonymous");
    assert_eq!(body["authenticated"], false);

    Ok(())
}

#[tokio::test]
async fn test_greeting_with_forged_token_is_anonymous() -> Result<(), anyhow::Error> {
    let keypair = TestKeypair::new(1);
    let (server, _keys) = spawn_with_remote_key(&keypair).await;
    let forged = TestKeypair::new(2).sign(&TestTokenBuilder::new().for_user("mallory").build());

    let response = reqwest::Client::new()
        .get(format!("{}/v1/greeting", server.url()))
        .bearer_auth(&forged)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["message"], "Hello, anonymous");

    Ok(())
}

#[tokio::test]
async fn test_key_endpoint_down() -> Result<(), anyhow::Error> {
    let keys = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pubkey"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&keys)
        .await;
    let key_url = format!("{}/pubkey", keys.uri());
    let server = TestWhoamiServer::spawn(&[
        ("VERIFICATION_KEY_URL", key_url.as_str()),
        ("JWT_ALGO", "EdDSA"),
    ])
    .await?;
    let token = TestKeypair::new(1).sign(&TestTokenBuilder::new().build());
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/v1/me", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{}/v1/greeting", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), 503);

    Ok(())
}

#[tokio::test]
async fn test_permanent_hmac_key() -> Result<(), anyhow::Error> {
    let secret = "whoami-shared-secret-for-tests";
    let server =
        TestWhoamiServer::spawn(&[("VERIFICATION_KEY", secret), ("JWT_ALGO", "HS256")]).await?;
    let token = sign_hmac(
        Algorithm::HS256,
        secret.as_bytes(),
        &TestTokenBuilder::new().for_user("carol").build(),
    );

    let response = reqwest::Client::new()
        .get(format!("{}/v1/me", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["subject"], "carol");

    Ok(())
}

#[tokio::test]
async fn test_missing_key_source_fails_to_start() {
    let result = TestWhoamiServer::spawn(&[("JWT_ALGO", "EdDSA")]).await;
    assert!(result.is_err());
}
