//! Mock key retrievers for testing.

use async_trait::async_trait;
use jwt_guard::{KeyRetrievalError, KeyRetriever, VerificationKey};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock key retriever that counts calls.
///
/// Share it through an `Arc` so the test can read `call_count` after handing
/// it to a `KeyProvider`:
///
/// ```rust,ignore
/// let retriever = Arc::new(MockKeyRetriever::returning(keypair.verification_key()));
/// let keys = KeyProvider::from_arc(retriever.clone());
/// // ...
/// assert_eq!(retriever.call_count(), 1);
/// ```
pub struct MockKeyRetriever {
    /// Keys to return (cycles through them).
    keys: Vec<VerificationKey>,
    /// Number of calls made.
    call_count: AtomicUsize,
    /// Whether to return errors.
    return_error: bool,
}

impl MockKeyRetriever {
    /// Create a mock that always returns `key`.
    pub fn returning(key: VerificationKey) -> Self {
        Self::with_keys(vec![key])
    }

    /// Create a mock that returns `keys` in sequence, cycling.
    pub fn with_keys(keys: Vec<VerificationKey>) -> Self {
        Self {
            keys,
            call_count: AtomicUsize::new(0),
            return_error: false,
        }
    }

    /// Create a mock that always fails.
    pub fn failing() -> Self {
        Self {
            keys: vec![],
            call_count: AtomicUsize::new(0),
            return_error: true,
        }
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyRetriever for MockKeyRetriever {
    async fn retrieve(&self) -> Result<VerificationKey, KeyRetrievalError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.return_error || self.keys.is_empty() {
            return Err(KeyRetrievalError::new("mock key retriever failure"));
        }

        let idx = count % self.keys.len();
        Ok(self.keys[idx].clone())
    }
}
