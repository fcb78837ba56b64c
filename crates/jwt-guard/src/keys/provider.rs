//! Verification key retrieval pipeline.
//!
//! `KeyProvider::current_verification_key` returns the key in effect:
//!
//! 1. the permanent key, if one is pinned;
//! 2. else the cached key, if fresh;
//! 3. else a key from the `KeyRetriever`, which is then cached.
//!
//! The cache lock is not held while the retriever runs. Concurrent stale
//! lookups may therefore retrieve more than once; the last store wins.

use super::cache::{KeyCache, Lookup};
use super::material::VerificationKey;
use crate::errors::KeyRetrievalError;
use crate::observability::metrics;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Source of verification keys.
///
/// There is no library default: key sourcing belongs to the application.
/// Async closures returning `Result<VerificationKey, KeyRetrievalError>`
/// implement this trait.
#[async_trait]
pub trait KeyRetriever: Send + Sync {
    /// Fetch the current verification key.
    async fn retrieve(&self) -> Result<VerificationKey, KeyRetrievalError>;
}

#[async_trait]
impl<F, Fut> KeyRetriever for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<VerificationKey, KeyRetrievalError>> + Send,
{
    async fn retrieve(&self) -> Result<VerificationKey, KeyRetrievalError> {
        (self)().await
    }
}

/// Retriever for providers built around a permanent key.
struct NoRetriever;

#[async_trait]
impl KeyRetriever for NoRetriever {
    async fn retrieve(&self) -> Result<VerificationKey, KeyRetrievalError> {
        Err(KeyRetrievalError::new(
            "no verification key retriever configured",
        ))
    }
}

/// Key cache plus the retriever that refills it.
pub struct KeyProvider {
    cache: KeyCache,
    retriever: Arc<dyn KeyRetriever>,
}

impl KeyProvider {
    /// Create a provider that retrieves keys on demand.
    pub fn new(retriever: impl KeyRetriever + 'static) -> Self {
        Self::from_arc(Arc::new(retriever))
    }

    /// Create a provider from a shared retriever.
    pub fn from_arc(retriever: Arc<dyn KeyRetriever>) -> Self {
        Self {
            cache: KeyCache::default(),
            retriever,
        }
    }

    /// Create a provider pinned to `key`. Nothing is ever retrieved.
    pub fn permanent(key: VerificationKey) -> Self {
        Self {
            cache: KeyCache::with_permanent(key),
            retriever: Arc::new(NoRetriever),
        }
    }

    /// Set the cache freshness window.
    pub fn with_cache_timeout(self, timeout: Duration) -> Self {
        self.cache.set_timeout(timeout);
        self
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }

    /// Pin `key`; the retriever is never called again.
    pub async fn set_permanent_verification_key(&self, key: VerificationKey) {
        self.cache.set_permanent(key).await;
    }

    /// Return the verification key currently in effect.
    ///
    /// # Errors
    ///
    /// Returns `KeyRetrievalError` if the cache is stale and the retriever
    /// fails. A stale key is never returned in that case.
    #[instrument(skip_all, name = "jwt_guard.keys.current")]
    pub async fn current_verification_key(&self) -> Result<VerificationKey, KeyRetrievalError> {
        match self.cache.lookup().await {
            Lookup::Permanent(key) => Ok(key),
            Lookup::Fresh(key) => {
                tracing::debug!(target: "jwt_guard.keys", "Verification key cache hit");
                Ok(key)
            }
            Lookup::Stale => self.refresh().await,
        }
    }

    /// Retrieve a key now, regardless of freshness, and cache it.
    ///
    /// Returns the key in effect afterwards, which is the permanent key if
    /// one is pinned.
    pub async fn refresh(&self) -> Result<VerificationKey, KeyRetrievalError> {
        if let Some(key) = self.cache.permanent().await {
            return Ok(key);
        }

        tracing::debug!(target: "jwt_guard.keys", "Retrieving verification key");
        let start = Instant::now();
        let result = self.retriever.retrieve().await;
        let duration = start.elapsed();

        let key = match result {
            Ok(key) if key.is_empty() => {
                tracing::error!(target: "jwt_guard.keys", "Key retriever returned an empty key");
                metrics::record_key_retrieval("error", duration);
                return Err(KeyRetrievalError::new("retriever returned an empty key"));
            }
            Ok(key) => key,
            Err(e) => {
                tracing::error!(target: "jwt_guard.keys", error = %e, "Verification key retrieval failed");
                metrics::record_key_retrieval("error", duration);
                return Err(e);
            }
        };

        metrics::record_key_retrieval("success", duration);
        tracing::info!(
            target: "jwt_guard.keys",
            key_bytes = key.len(),
            "Verification key cache refreshed"
        );

        Ok(self.cache.store(key).await)
    }
}
