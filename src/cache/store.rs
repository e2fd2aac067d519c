//! Cache storage: a string-keyed TTL store for dashboard query results.
//!
//! The store is an injectable collaborator, never a module-level singleton,
//! so tests can substitute their own instance and drive the clock. Values are
//! JSON documents; every cached result is idempotently recomputable, which is
//! the only reason process-wide shared ownership of this state is acceptable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Backing-store operations. A remote store slots in behind this trait; the
/// rest of the system only sees [`Cache`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<JsonValue>;
    async fn set(&self, key: &str, value: JsonValue, ttl: Duration);
    async fn delete(&self, key: &str);
    /// Remove every key sharing `prefix`, immediately.
    async fn invalidate_prefix(&self, prefix: &str);
    /// Drop expired entries. Expiry is lazy on `get`; this only reclaims
    /// memory.
    async fn sweep(&self);
}

struct CacheEntry {
    value: JsonValue,
    expires_at: Instant,
}

/// In-process store with lazy expiration.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<JsonValue> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        // Expired entries are treated as absent and dropped on touch.
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }

    async fn sweep(&self) {
        let now = Instant::now();
        // Counted inside the closure; a length diff could underflow when
        // inserts race the sweep.
        let mut dropped: u64 = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                dropped += 1;
            }
            keep
        });
        if dropped > 0 {
            counter!("vetrina_cache_swept_total").increment(dropped);
            debug!(target = "vetrina::cache", dropped, "swept expired entries");
        }
    }
}

/// Pass-through store used when caching is disabled or misconfigured: `get`
/// always misses, writes are no-ops. Callers never branch on availability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl CacheStore for NoopStore {
    async fn get(&self, _key: &str) -> Option<JsonValue> {
        None
    }

    async fn set(&self, _key: &str, _value: JsonValue, _ttl: Duration) {}

    async fn delete(&self, _key: &str) {}

    async fn invalidate_prefix(&self, _prefix: &str) {}

    async fn sweep(&self) {}
}

/// Typed facade over a [`CacheStore`].
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopStore))
    }

    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    /// Return the cached value under `key` when present and fresh, otherwise
    /// run `compute` once and cache its result for `ttl`.
    ///
    /// A hit that fails to deserialize (shape drift across deploys) is
    /// treated as a miss. Concurrent misses for one key may recompute
    /// redundantly; that stampede is accepted because the underlying queries
    /// are cheap and idempotent.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.store.get(key).await {
            match serde_json::from_value(cached) {
                Ok(value) => {
                    counter!("vetrina_cache_hit_total").increment(1);
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        target = "vetrina::cache",
                        key,
                        error = %err,
                        "cached value no longer deserializes, recomputing"
                    );
                    self.store.delete(key).await;
                }
            }
        }

        counter!("vetrina_cache_miss_total").increment(1);
        let value = compute().await?;
        match serde_json::to_value(&value) {
            Ok(serialized) => self.store.set(key, serialized, ttl).await,
            Err(err) => warn!(
                target = "vetrina::cache",
                key,
                error = %err,
                "computed value is not cacheable"
            ),
        }
        Ok(value)
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        counter!("vetrina_cache_invalidation_total").increment(1);
        self.store.invalidate_prefix(prefix).await;
    }

    pub async fn delete(&self, key: &str) {
        self.store.delete(key).await;
    }
}
