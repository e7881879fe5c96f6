//! Process-wide permission cache.
//!
//! The cache is purely an optimization: business logic never depends on it
//! for correctness, only on its invalidation being called at the right
//! moments. The backing store is swappable — an in-process map here, a
//! networked store in a bigger deployment — behind the same contract, and
//! consumers must not be able to tell which one they got.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default time-to-live for transient entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default entry cap for the in-process store.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Key-value cache contract.
///
/// Failure contract: `get` must degrade to a miss on any backing-store
/// failure so callers always fall through to recomputation; it never
/// errors. `set` failures are logged and swallowed by implementations —
/// a value that failed to cache is recomputed next time, nothing more.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. `None` on a miss, an expired entry, or any
    /// backing-store failure.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value. `ttl = None` keeps the entry until invalidated.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>);

    /// Drop one entry.
    async fn invalidate(&self, key: &str);

    /// Drop everything. Called on shutdown and between tests.
    async fn clear(&self);
}

struct CacheEntry {
    value: Value,
    seq: u64,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
}

/// In-process [`CacheStore`] backed by a map with per-entry expiry.
///
/// Expired entries are dropped lazily on read. When the entry cap is
/// exceeded, expired entries go first, then the oldest by insertion order.
pub struct MemoryCache {
    inner: RwLock<Inner>,
    max_entries: usize,
}

impl MemoryCache {
    /// Create a store with the default entry cap.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store holding at most `max_entries` values.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of live entries, counting not-yet-collected expired ones.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    fn evict_over_cap(inner: &mut Inner, max_entries: usize) {
        if inner.entries.len() <= max_entries {
            return;
        }
        let now = Instant::now();
        inner.entries.retain(|_, e| !e.expired(now));

        while inner.entries.len() > max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    debug!(key = %key, "Evicting cache entry over capacity");
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        match inner.entries.get(key) {
            Some(entry) if !entry.expired(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        inner.entries.remove(key);
        None
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                seq,
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Self::evict_over_cap(&mut inner, self.max_entries);
    }

    async fn invalidate(&self, key: &str) {
        self.inner.write().await.entries.remove(key);
    }

    async fn clear(&self) {
        self.inner.write().await.entries.clear();
    }
}
