//! jwt-guard: JWT validation middleware for axum services.
//!
//! This library verifies bearer tokens on incoming requests and exposes the
//! authentication result to downstream handlers:
//!
//! - Token extraction from the request (RFC 6750 header, query and form sources)
//! - Signature and time-claim validation against a verification key
//! - Verification key caching with a bounded freshness window
//! - `require_authentication` / `optional_authentication` middleware
//!
//! # Architecture
//!
//! Every pluggable behavior is a strategy trait with a public default
//! implementation, so an override can delegate to the default:
//!
//! ```text
//! middleware -> TokenExtractor -> KeyProvider (KeyCache + KeyRetriever) -> TokenValidator
//!            \-> FailureHandler (requires / optional)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use jwt_guard::{optional_authentication, require_authentication, JwtAuth, KeyProvider};
//!
//! let keys = KeyProvider::new(|| async { fetch_public_key().await });
//! let auth = Arc::new(JwtAuth::new(keys));
//!
//! let app = Router::new()
//!     .route("/me", get(me).layer(from_fn_with_state(auth.clone(), require_authentication)))
//!     .route("/feed", get(feed).layer(from_fn_with_state(auth, optional_authentication)));
//! ```
//!
//! # Modules
//!
//! - `config` - Configuration from environment
//! - `errors` - Error taxonomy and HTTP rejection mapping
//! - `keys` - Verification key material, cache and retrieval pipeline
//! - `token` - Token extraction, validation and decoded claims
//! - `middleware` - Authentication middleware, request context, failure handlers
//! - `observability` - Metrics definitions

pub mod config;
pub mod errors;
pub mod keys;
pub mod middleware;
pub mod observability;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use errors::{AuthFailure, AuthRejection, ExtractionError, KeyRetrievalError, ValidationError};
pub use keys::{
    HttpKeyRetriever, KeyCache, KeyProvider, KeyRetriever, VerificationKey,
    DEFAULT_KEY_CACHE_TIMEOUT,
};
pub use middleware::{
    optional_authentication, require_authentication, AuthAttempt, AuthContext, AuthContextExt,
    FailureHandler, JwtAuth, RejectUnauthorized, RejectUnavailable,
};
pub use token::{
    decode_unverified, decode_verified, DecodedToken, DefaultTokenExtractor,
    DefaultTokenValidator, RawToken, TokenExtractor, TokenValidator, ValidationSettings,
};
