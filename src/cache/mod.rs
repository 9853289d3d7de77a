//! TTL cache for tool results
//!
//! Deduplicates calls to paid upstream APIs (web search in particular).
//! An entry is served until its expiry instant; after that the next read
//! drops it and the caller fetches a fresh value.
//!
//! # Example
//!
//! ```ignore
//! use axon::cache::ToolCache;
//!
//! let cache = ToolCache::with_ttl(Duration::from_secs(3600));
//! let key = ToolCache::compute_key("web_search", "rust async");
//! let hit = cache
//!     .get_or_insert_with(&key, None, || async { fetch_results().await })
//!     .await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::types::Result;
use crate::utils::toml_config::CacheConfig;

// ============================================================================
// Cache Types
// ============================================================================

/// Statistics reported by `/api/health`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    /// Entries dropped by the `max_entries` cap
    pub evictions: u64,
    /// Hit rate as a percentage
    pub hit_rate: f64,
}

/// A value returned from `get_or_insert_with`, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct CachedValue {
    pub value: Value,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// Tool Cache
// ============================================================================

/// Longest TTL an entry can be given
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// In-memory key/value cache with per-entry expiry.
///
/// Thread-safe via `parking_lot::RwLock`; share it as `Arc<ToolCache>`.
pub struct ToolCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    enabled: bool,
    default_ttl: Duration,
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ToolCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            enabled: config.enabled,
            default_ttl: Duration::from_secs(config.default_ttl_secs),
            max_entries: config.max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Enabled, unbounded cache with the given default TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: ttl,
            ..Self::new(&CacheConfig::default())
        }
    }

    /// Cache key for a tool query, e.g. `web_search:rust`
    pub fn compute_key(namespace: &str, query: &str) -> String {
        format!("{}:{}", namespace, query)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the value if present and unexpired. Expired entries are removed.
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Expired: re-check under the write lock, a writer may have refreshed it
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value. `ttl = None` uses the configured default.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        if !self.enabled {
            return;
        }

        let now = Instant::now();
        let ttl = ttl.unwrap_or(self.default_ttl).min(MAX_TTL);
        let entry = CacheEntry {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(now),
        };

        let mut entries = self.entries.write();
        if let Some(cap) = self.max_entries {
            if !entries.contains_key(key) && entries.len() >= cap {
                self.make_room(&mut entries, now, cap);
            }
        }
        entries.insert(key.to_string(), entry);
    }

    /// Sweep expired entries, then drop the ones closest to expiry until under `cap`.
    fn make_room(&self, entries: &mut HashMap<String, CacheEntry>, now: Instant, cap: usize) {
        entries.retain(|_, entry| !entry.is_expired(now));

        while entries.len() >= cap {
            let soonest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());

            match soonest {
                Some(key) => {
                    entries.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
    }

    /// Return the cached value for `key`, or run `fetch`, store its result and
    /// return it. Errors from `fetch` are passed through and not cached.
    pub async fn get_or_insert_with<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(CachedValue {
                value,
                from_cache: true,
            });
        }

        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(CachedValue {
            value,
            from_cache: false,
        })
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            entries: self.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                (hits as f64 / total as f64) * 100.0
            },
        }
    }
}

impl Default for ToolCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
