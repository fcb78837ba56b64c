//! RS256 verification tests.
//!
//! RS256 is the default algorithm, so these cover the path most deployments
//! take: SPKI PEM keys, PKCS#1 DER keys and the default middleware setup.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use jsonwebtoken::Algorithm;
use jwt_guard::{
    decode_verified, DefaultTokenValidator, JwtAuth, KeyProvider, TokenValidator,
    ValidationError, ValidationSettings, VerificationKey,
};
use jwt_guard_test_utils::*;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_rs256_pem_key_returns_signed_claims() {
    let rsa = TestRsaKeypair::primary();
    let claims = TestTokenBuilder::new()
        .for_user("alice")
        .with_claim("scope", json!("read write"))
        .build();
    let token = rsa.sign(&claims);

    let decoded = decode_verified(
        &token,
        &rsa.verification_key(),
        &ValidationSettings::default(),
    )
    .unwrap();

    assert_eq!(Some(decoded.claims()), claims.as_object());
    assert_eq!(decoded.subject(), Some("alice"));
}

#[test]
fn test_rs256_pkcs1_der_key_returns_signed_claims() {
    let rsa = TestRsaKeypair::primary();
    let claims = TestTokenBuilder::new().for_user("bob").build();
    let token = rsa.sign(&claims);

    let decoded = decode_verified(
        &token,
        &rsa.der_verification_key(),
        &ValidationSettings::default(),
    )
    .unwrap();

    assert_eq!(Some(decoded.claims()), claims.as_object());
}

#[test]
fn test_rs256_wrong_pem_key_is_invalid_signature() {
    let token = TestRsaKeypair::primary().sign(&TestTokenBuilder::new().build());

    let result = decode_verified(
        &token,
        &TestRsaKeypair::secondary().verification_key(),
        &ValidationSettings::default(),
    );

    assert_eq!(result, Err(ValidationError::InvalidSignature));
}

#[test]
fn test_rs256_wrong_der_key_is_invalid_signature() {
    let token = TestRsaKeypair::primary().sign(&TestTokenBuilder::new().build());

    let result = decode_verified(
        &token,
        &TestRsaKeypair::secondary().der_verification_key(),
        &ValidationSettings::default(),
    );

    assert_eq!(result, Err(ValidationError::InvalidSignature));
}

#[test]
fn test_ps256_with_rsa_key() {
    let rsa = TestRsaKeypair::primary();
    let claims = TestTokenBuilder::new().for_user("carol").build();
    let token = rsa.sign_with_algorithm(Algorithm::PS256, &claims);
    let settings = ValidationSettings::for_algorithm(Algorithm::PS256);

    let decoded = decode_verified(&token, &rsa.verification_key(), &settings).unwrap();
    assert_eq!(decoded.subject(), Some("carol"));

    // Same key, but the token header says PS256 while RS256 is required
    let result = decode_verified(
        &token,
        &rsa.verification_key(),
        &ValidationSettings::default(),
    );
    assert_eq!(result, Err(ValidationError::AlgorithmMismatch));
}

#[test]
fn test_rs256_garbage_key_is_rejected() {
    let token = TestRsaKeypair::primary().sign(&TestTokenBuilder::new().build());
    let key = VerificationKey::new(b"not an rsa key".to_vec());

    let result = decode_verified(&token, &key, &ValidationSettings::default());

    assert!(result.is_err());
}

#[tokio::test]
async fn test_default_validator_accepts_rs256() {
    let rsa = TestRsaKeypair::primary();
    let token = rsa.sign(&TestTokenBuilder::new().for_user("dave").build());
    let validator = DefaultTokenValidator::default();

    assert_eq!(validator.algorithm().await, Algorithm::RS256);
    let decoded = validator
        .validate(&token, &rsa.verification_key())
        .await
        .unwrap();
    assert_eq!(decoded.subject(), Some("dave"));
}

#[tokio::test]
async fn test_default_middleware_with_rs256_pem_key() {
    let rsa = TestRsaKeypair::primary();
    let app = TestApp::new(Arc::new(JwtAuth::new(KeyProvider::permanent(
        rsa.verification_key(),
    ))));
    let token = rsa.sign(&TestTokenBuilder::new().for_user("alice").build());

    let (status, body) = app.send(get_with_bearer(REQUIRED_PATH, &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"]["sub"], "alice");
    assert_eq!(app.handler_calls(), 1);
}

#[tokio::test]
async fn test_default_middleware_with_rs256_der_key() {
    let rsa = TestRsaKeypair::primary();
    let retriever = Arc::new(MockKeyRetriever::returning(rsa.der_verification_key()));
    let app = TestApp::new(Arc::new(JwtAuth::new(KeyProvider::from_arc(
        retriever.clone(),
    ))));
    let token = rsa.sign(&TestTokenBuilder::new().for_user("erin").build());

    let (status, body) = app.send(get_with_bearer(REQUIRED_PATH, &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"]["sub"], "erin");
    assert_eq!(retriever.call_count(), 1);
}

#[tokio::test]
async fn test_default_middleware_rejects_token_from_other_rsa_key() {
    let app = TestApp::new(Arc::new(JwtAuth::new(KeyProvider::permanent(
        TestRsaKeypair::primary().verification_key(),
    ))));
    let forged =
        TestRsaKeypair::secondary().sign(&TestTokenBuilder::new().for_user("mallory").build());

    let (status, body) = app.send(get_with_bearer(REQUIRED_PATH, &forged)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert_eq!(app.handler_calls(), 0);
}
