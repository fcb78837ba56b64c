//! HTTP key retriever.
//!
//! Fetches verification key material (typically a PEM public key) from an
//! identity provider endpoint such as `https://idp.example.com/pubkey`.
//! The response body is used verbatim as the key.
//!
//! HTTPS should be used in production (enforced by deployment config).

use super::material::VerificationKey;
use super::provider::KeyRetriever;
use crate::errors::KeyRetrievalError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Default request timeout for key retrieval.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// `KeyRetriever` that GETs key material from a URL.
pub struct HttpKeyRetriever {
    /// URL serving the key.
    key_url: String,

    /// HTTP client for fetching the key.
    http_client: reqwest::Client,
}

impl HttpKeyRetriever {
    /// Create a retriever with the default request timeout.
    pub fn new(key_url: impl Into<String>) -> Self {
        Self::with_timeout(key_url, DEFAULT_RETRIEVAL_TIMEOUT)
    }

    /// Create a retriever with a custom request timeout.
    ///
    /// The timeout bounds the latency that a stale cache adds to a request.
    pub fn with_timeout(key_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "jwt_guard.keys.http", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            key_url: key_url.into(),
            http_client,
        }
    }

    pub fn key_url(&self) -> &str {
        &self.key_url
    }
}

#[async_trait]
impl KeyRetriever for HttpKeyRetriever {
    #[instrument(skip_all, fields(url = %self.key_url))]
    async fn retrieve(&self) -> Result<VerificationKey, KeyRetrievalError> {
        tracing::debug!(target: "jwt_guard.keys.http", url = %self.key_url, "Fetching verification key");

        let response = self
            .http_client
            .get(&self.key_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "jwt_guard.keys.http", error = %e, "Failed to fetch verification key");
                KeyRetrievalError::new(format!("request to key endpoint failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "jwt_guard.keys.http",
                status = %status,
                "Key endpoint returned error"
            );
            return Err(KeyRetrievalError::new(format!(
                "key endpoint returned {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(target: "jwt_guard.keys.http", error = %e, "Failed to read key response body");
            KeyRetrievalError::new(format!("failed to read key response: {e}"))
        })?;

        Ok(VerificationKey::from(body))
    }
}
