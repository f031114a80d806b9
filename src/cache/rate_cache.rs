//! TTL-governed cache of rate tables, one entry per base currency.
//!
//! Staleness is advisory: `get` with `allow_stale` returns an expired entry
//! as long as it survives the 2×TTL sweep horizon. Callers own the freshness
//! policy; the cache only reports what it has.

use crate::cache::store::KvStore;
use crate::rates::table::{CurrencyCode, RateTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const KEY_PREFIX: &str = "rates:";

/// One cached rate table. Owned exclusively by [`RateCache`];
/// last-write-wins per base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub base: CurrencyCode,
    pub rates: RateTable,
    /// Insertion time, unix milliseconds.
    pub inserted_at: u64,
}

impl CacheEntry {
    fn age_at(&self, now: u64) -> Duration {
        Duration::from_millis(now.saturating_sub(self.inserted_at))
    }
}

/// Read-only cache introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: usize,
    /// Oldest insertion time across entries, unix milliseconds.
    pub oldest_timestamp: Option<u64>,
}

/// Durable rate cache with a fixed TTL.
#[derive(Clone)]
pub struct RateCache {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn key_for(base: CurrencyCode) -> String {
    format!("{KEY_PREFIX}{base}")
}

impl RateCache {
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch the entry for `base`, if present and fresh enough.
    ///
    /// With `allow_stale` the TTL check is skipped entirely. Store failures
    /// and corrupt payloads are logged and reported as a miss, never raised.
    pub fn get(&self, base: CurrencyCode, allow_stale: bool) -> Option<CacheEntry> {
        let raw = match self.store.get(&key_for(base)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(base = %base, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(base = %base, error = %e, "corrupt cache entry, treating as miss");
                return None;
            }
        };

        let age = entry.age_at(now_millis());
        if !allow_stale && age >= self.ttl {
            tracing::debug!(base = %base, age_secs = age.as_secs(), "cache entry stale");
            return None;
        }

        Some(entry)
    }

    /// Store `rates` for `base` with the current timestamp, overwriting any
    /// prior entry, then opportunistically sweep entries past 2×TTL.
    ///
    /// Write failures are logged as warnings; the caller already holds the
    /// table and loses nothing but durability.
    pub fn put(&self, base: CurrencyCode, rates: &RateTable) {
        let now = now_millis();
        let entry = CacheEntry {
            base,
            rates: rates.clone(),
            inserted_at: now,
        };

        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&key_for(base), &raw) {
                    tracing::warn!(base = %base, error = %e, "cache write failed");
                }
            }
            Err(e) => {
                tracing::warn!(base = %base, error = %e, "cache entry serialization failed");
            }
        }

        self.sweep(now);
    }

    /// Remove all rate entries unconditionally.
    pub fn clear(&self) {
        for key in self.rate_keys() {
            if let Err(e) = self.store.remove(&key) {
                tracing::warn!(key = %key, error = %e, "cache clear failed for key");
            }
        }
    }

    /// Read-only stats over all entries; corrupt entries count toward size
    /// but not toward the oldest timestamp.
    pub fn stats(&self) -> CacheStats {
        let mut entry_count = 0;
        let mut total_size_bytes = 0;
        let mut oldest_timestamp: Option<u64> = None;

        for key in self.rate_keys() {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                _ => continue,
            };
            entry_count += 1;
            total_size_bytes += raw.len();
            if let Ok(entry) = serde_json::from_str::<CacheEntry>(&raw) {
                oldest_timestamp = Some(match oldest_timestamp {
                    Some(oldest) => oldest.min(entry.inserted_at),
                    None => entry.inserted_at,
                });
            }
        }

        CacheStats {
            entry_count,
            total_size_bytes,
            oldest_timestamp,
        }
    }

    /// Drop entries older than 2×TTL across all keys to bound storage
    /// growth. Unreadable entries are removed too. Failures are non-fatal.
    fn sweep(&self, now: u64) {
        let horizon = self.ttl * 2;
        for key in self.rate_keys() {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "sweep read failed");
                    continue;
                }
            };

            let expired = match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) => entry.age_at(now) > horizon,
                Err(_) => true,
            };

            if expired {
                tracing::debug!(key = %key, "sweeping expired cache entry");
                if let Err(e) = self.store.remove(&key) {
                    tracing::warn!(key = %key, error = %e, "sweep remove failed");
                }
            }
        }
    }

    fn rate_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(KEY_PREFIX))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "cache key enumeration failed");
                Vec::new()
            }
        }
    }
}
