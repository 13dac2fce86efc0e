//! In-process TTL cache.
//!
//! Entries expire lazily on read and in bulk when [`TtlCache::sweep`] runs.
//! There is no capacity bound; memory is reclaimed only through expiry,
//! explicit deletes, and `clear`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use metrics::{counter, gauge};
use serde::Serialize;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "folio_cache_hit_total";
const METRIC_MISS: &str = "folio_cache_miss_total";
const METRIC_EXPIRED: &str = "folio_cache_expired_total";
const METRIC_SWEPT: &str = "folio_cache_swept_total";
const METRIC_ENTRIES: &str = "folio_cache_entries";

// Keeps `Instant + ttl` from overflowing on absurd inputs.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 10);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Point-in-time view of the cache contents.
///
/// `expired` counts entries whose lifetime lapsed but which no read or sweep
/// has removed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

/// Thread-safe key/value store with per-entry expiration.
///
/// Writes are last-write-wins; there is no versioning.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl: config.default_ttl(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the value for `key` if it has not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key, V::clone)
    }

    /// Same outcome and side effect as [`get`](Self::get), without cloning.
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key, |_| ()).is_some()
    }

    /// Store `value` under `key` until `now + ttl`, replacing any previous entry.
    ///
    /// A zero `ttl` stores an entry that is already expired.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_TTL);
        let mut entries = rw_write(&self.entries, SOURCE, "set");
        entries.insert(key.into(), Entry { value, expires_at });
        gauge!(METRIC_ENTRIES).set(entries.len() as f64);
    }

    /// [`set`](Self::set) with the configured default lifetime.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    pub fn delete(&self, key: &str) {
        let mut entries = rw_write(&self.entries, SOURCE, "delete");
        entries.remove(key);
        gauge!(METRIC_ENTRIES).set(entries.len() as f64);
    }

    /// Remove every entry whose key starts with `prefix`, returning how many went.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_prefix");
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        gauge!(METRIC_ENTRIES).set(entries.len() as f64);
        before - entries.len()
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        gauge!(METRIC_ENTRIES).set(0.0);
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = rw_read(&self.entries, SOURCE, "stats");
        let active = entries.values().filter(|entry| entry.is_live(now)).count();
        CacheStats {
            total: entries.len(),
            active,
            expired: entries.len() - active,
        }
    }

    /// Drop every expired entry and return how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "sweep");
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        counter!(METRIC_SWEPT).increment(removed as u64);
        gauge!(METRIC_ENTRIES).set(entries.len() as f64);
        removed
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T>(&self, key: &str, read: impl FnOnce(&V) -> T) -> Option<T> {
        {
            let entries = rw_read(&self.entries, SOURCE, "lookup");
            match entries.get(key) {
                None => {
                    counter!(METRIC_MISS).increment(1);
                    return None;
                }
                Some(entry) if entry.is_live(Instant::now()) => {
                    counter!(METRIC_HIT).increment(1);
                    return Some(read(&entry.value));
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent `set` may have refreshed the entry.
        let mut entries = rw_write(&self.entries, SOURCE, "lookup.expire");
        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => {
                counter!(METRIC_HIT).increment(1);
                Some(read(&entry.value))
            }
            Some(_) => {
                entries.remove(key);
                counter!(METRIC_EXPIRED).increment(1);
                counter!(METRIC_MISS).increment(1);
                gauge!(METRIC_ENTRIES).set(entries.len() as f64);
                None
            }
            None => {
                counter!(METRIC_MISS).increment(1);
                None
            }
        }
    }
}
