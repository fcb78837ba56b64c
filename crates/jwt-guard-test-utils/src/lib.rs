//! # jwt-guard Test Utilities
//!
//! Shared test utilities for jwt-guard and services built on it.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed Ed25519 keypairs, HMAC secrets)
//! - Token claim builders (TestTokenBuilder)
//! - Mock key retrievers (MockKeyRetriever)
//! - Router harness for driving the middleware in-process
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jwt_guard_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = TestKeypair::new(1);
//!     let token = keypair.sign(&TestTokenBuilder::new().for_user("alice").build());
//!
//!     let retriever = Arc::new(MockKeyRetriever::returning(keypair.verification_key()));
//!     let auth = eddsa_auth(KeyProvider::from_arc(retriever.clone()));
//!
//!     let app = TestApp::new(Arc::new(auth));
//!     let (status, body) = app.send(get_with_bearer(REQUIRED_PATH, &token)).await;
//!     assert_eq!(status, StatusCode::OK);
//!     assert_eq!(retriever.call_count(), 1);
//! }
//! ```

pub mod crypto_fixtures;
pub mod harness;
pub mod retrievers;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use harness::*;
pub use retrievers::*;
pub use token_builders::*;
