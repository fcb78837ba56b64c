//! Verification key handling.
//!
//! # Components
//!
//! - `material` - Opaque key bytes and conversion into `jsonwebtoken` decoding keys
//! - `cache` - Process-wide key slot (empty, cached with timestamp, or permanent)
//! - `provider` - Retrieval pipeline returning the key currently in effect
//! - `http` - `KeyRetriever` fetching key material from a URL

pub mod cache;
pub mod http;
pub mod material;
pub mod provider;

pub use cache::{CachedKey, KeyCache, DEFAULT_KEY_CACHE_TIMEOUT};
pub use http::HttpKeyRetriever;
pub use material::VerificationKey;
pub use provider::{KeyProvider, KeyRetriever};
