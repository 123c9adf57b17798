//! In-memory TTL cache for fetch results.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

/// Maps string keys to values that expire after a per-entry TTL.
///
/// Eviction is lazy: an expired entry is dropped when a read touches it,
/// nothing runs in the background. Writes overwrite unconditionally,
/// including entries that have not expired yet.
pub struct TtlCache<T> {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a clone of the value if the entry is still valid.
    ///
    /// An entry read exactly at its expiry instant is still served; it
    /// expires strictly after `ttl` has passed.
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at >= Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key` with the cache-wide default TTL.
    pub async fn insert(&self, key: impl Into<String>, value: T) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    /// Stores `value` with an explicit TTL, replacing any previous entry.
    pub async fn insert_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.into(), entry);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Entry count including entries that expired but were never read.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
