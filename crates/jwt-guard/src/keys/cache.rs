//! Verification key cache.
//!
//! Holds a single verification key in one of three states:
//!
//! ```text
//! Empty --store--> Cached{key, fetched_at} --store--> Cached{...}
//!   |                    |
//!   +--set_permanent-----+-----> Permanent(key)   (no way back)
//! ```
//!
//! A cached entry is fresh while `now - fetched_at < timeout`. An absent entry
//! is always stale. The slot is replaced as a whole under a lock, so readers
//! never observe a key paired with another key's timestamp.

use super::material::VerificationKey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default cache timeout (5 minutes).
pub const DEFAULT_KEY_CACHE_TIMEOUT: Duration = Duration::from_secs(300);

/// A retrieved key paired with the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CachedKey {
    key: VerificationKey,
    fetched_at: Instant,
}

impl CachedKey {
    pub fn key(&self) -> &VerificationKey {
        &self.key
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Time elapsed since the key was fetched.
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

#[derive(Debug, Clone, Default)]
enum KeySlot {
    #[default]
    Empty,
    Cached(CachedKey),
    Permanent(VerificationKey),
}

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub(crate) enum Lookup {
    Permanent(VerificationKey),
    Fresh(VerificationKey),
    Stale,
}

/// Process-wide verification key slot.
pub struct KeyCache {
    slot: RwLock<KeySlot>,

    /// Freshness window in nanoseconds; adjustable at runtime.
    timeout_ns: AtomicU64,
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_CACHE_TIMEOUT)
    }
}

impl KeyCache {
    /// Create an empty cache with the given freshness window.
    pub fn new(timeout: Duration) -> Self {
        Self {
            slot: RwLock::new(KeySlot::Empty),
            timeout_ns: AtomicU64::new(duration_to_ns(timeout)),
        }
    }

    /// Create a cache that starts with a permanent key.
    pub fn with_permanent(key: VerificationKey) -> Self {
        Self {
            slot: RwLock::new(KeySlot::Permanent(key)),
            timeout_ns: AtomicU64::new(duration_to_ns(DEFAULT_KEY_CACHE_TIMEOUT)),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_nanos(self.timeout_ns.load(Ordering::Relaxed))
    }

    /// Change the freshness window. Applies to existing entries on their
    /// next lookup.
    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_ns
            .store(duration_to_ns(timeout), Ordering::Relaxed);
    }

    /// Pin a key. Cached entries are discarded and retrieval stops for the
    /// lifetime of this cache. Calling again replaces the pinned key.
    pub async fn set_permanent(&self, key: VerificationKey) {
        let mut slot = self.slot.write().await;
        if matches!(*slot, KeySlot::Cached(_)) {
            tracing::info!(target: "jwt_guard.keys", "Permanent verification key replaces cached key");
        }
        *slot = KeySlot::Permanent(key);
    }

    /// The pinned key, if any.
    pub async fn permanent(&self) -> Option<VerificationKey> {
        match &*self.slot.read().await {
            KeySlot::Permanent(key) => Some(key.clone()),
            _ => None,
        }
    }

    /// The cached entry, if any. Does not check freshness.
    pub async fn cached(&self) -> Option<CachedKey> {
        match &*self.slot.read().await {
            KeySlot::Cached(entry) => Some(entry.clone()),
            _ => None,
        }
    }

    /// Whether `entry` is present and younger than the timeout.
    pub fn is_fresh(&self, entry: Option<&CachedKey>) -> bool {
        entry.is_some_and(|entry| entry.age() < self.timeout())
    }

    /// Cache a freshly retrieved key with `fetched_at = now`.
    ///
    /// Returns the key now in effect: a permanent key pinned in the meantime
    /// is never overwritten and wins.
    pub async fn store(&self, key: VerificationKey) -> VerificationKey {
        let mut slot = self.slot.write().await;
        if let KeySlot::Permanent(permanent) = &*slot {
            tracing::debug!(target: "jwt_guard.keys", "Ignoring retrieved key, permanent key is set");
            return permanent.clone();
        }
        *slot = KeySlot::Cached(CachedKey {
            key: key.clone(),
            fetched_at: Instant::now(),
        });
        key
    }

    /// Drop the cached entry so the next lookup retrieves again.
    /// A permanent key is left untouched.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        if matches!(*slot, KeySlot::Cached(_)) {
            *slot = KeySlot::Empty;
        }
    }

    pub(crate) async fn lookup(&self) -> Lookup {
        let slot = self.slot.read().await;
        match &*slot {
            KeySlot::Permanent(key) => Lookup::Permanent(key.clone()),
            KeySlot::Cached(entry) if self.is_fresh(Some(entry)) => {
                Lookup::Fresh(entry.key.clone())
            }
            _ => Lookup::Stale,
        }
    }
}

/// Saturates at roughly 584 years.
fn duration_to_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
