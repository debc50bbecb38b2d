//! In-memory, TTL-indexed cache from cache-key to a previously computed
//! [`SearchResponse`].
//!
//! Key derivation is external and adapter-specific (see [`cache_key`]);
//! this module only owns the expiry bookkeeping. Backed by [`DashMap`] so
//! that concurrent `get`/`set` never blocks behind a single global lock —
//! `get`-then-`set` is intentionally not atomic (see module-level
//! concurrency note on [`Cache`]).

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::model::SearchResponse;

/// Default time-to-live for a cached response: one hour.
pub const DEFAULT_TTL_MS: u64 = 3_600_000;

struct CacheEntry {
    value: SearchResponse,
    expire_at: Instant,
}

/// Result of a [`Cache::get`] lookup.
///
/// The cache backend here is a plain in-process map and cannot itself fail,
/// so there is no `storage` error variant to surface — a get either hits a
/// live entry or misses (including a miss on an expired entry, which is
/// evicted as a side effect).
pub enum CacheLookup {
    Hit(SearchResponse),
    Miss,
}

/// Concurrent TTL cache. Safe under concurrent `get`/`set` from many tasks;
/// a race between two `get`-miss callers both fetching and `set`-ing the
/// same key is permitted — both writers win and the last `set` overwrites,
/// which is acceptable per the cache contract.
#[derive(Default)]
pub struct Cache {
    entries: DashMap<String, CacheEntry>,
}

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Look up `key`. Never blocks on I/O — this is a pure in-memory check.
    pub fn get(&self, key: &str) -> CacheLookup {
        let Some(entry) = self.entries.get(key) else {
            return CacheLookup::Miss;
        };
        if entry.expire_at > Instant::now() {
            return CacheLookup::Hit(entry.value.clone());
        }
        drop(entry);
        self.entries.remove(key);
        CacheLookup::Miss
    }

    /// Insert or overwrite `key` with a fresh entry expiring in `ttl`.
    pub fn set(&self, key: impl Into<String>, value: SearchResponse, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry { value, expire_at: Instant::now() + ttl },
        );
    }

    /// Insert using the [`DEFAULT_TTL_MS`] lifetime.
    pub fn set_default_ttl(&self, key: impl Into<String>, value: SearchResponse) {
        self.set(key, value, Duration::from_millis(DEFAULT_TTL_MS));
    }

    /// Evict every expired entry. Bulk maintenance — not required before
    /// `get` (which evicts lazily), but useful to bound memory growth.
    pub fn remove_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expire_at > now);
    }

    /// Drop every entry regardless of expiry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive the cache key for one adapter + query shape.
///
/// Format: `search:{adapterId}:{q}:{maxResults}:{country|"any"}:{language|"any"}`.
/// `q` is used verbatim — callers must not trim or case-fold it here, since
/// that normalisation belongs upstream in request validation, not in key
/// derivation.
#[must_use]
pub fn cache_key(
    adapter_id: &str,
    q: &str,
    max_results: u32,
    country: Option<&str>,
    language: Option<&str>,
) -> String {
    format!(
        "search:{adapter_id}:{q}:{max_results}:{}:{}",
        country.unwrap_or("any"),
        language.unwrap_or("any"),
    )
}
