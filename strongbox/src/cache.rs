// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Cache
//!
//! An LRU cache with per-entry TTL and byte-size accounting, sitting in
//! front of a [`crate::adapters::pipeline::PipelineAdapter`] to absorb
//! repeat reads without re-running decompression/decryption.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;

use strongbox_domain::config::CacheConfig;
use strongbox_domain::key::StorageKey;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// Fallback size charged against the byte budget when a value can't be
/// JSON-serialized to measure (should not happen for `serde_json::Value`,
/// but a missing number must bias towards eviction, not unbounded growth).
const SIZE_ESTIMATE_FALLBACK: u64 = 1024;

struct CacheEntry {
    value: Value,
    inserted_at_ms: i64,
    ttl_ms: i64,
    size_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size_bytes: u64,
    pub item_count: u64,
}

pub struct Cache {
    entries: Mutex<LruCache<StorageKey, CacheEntry>>,
    config: CacheConfig,
    stats: Mutex<CacheStats>,
    sweep_handle: Mutex<Option<JoinHandle<()>>>,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn estimate_size(value: &Value) -> u64 {
    serde_json::to_vec(value).map(|b| 2 * b.len() as u64).unwrap_or(SIZE_ESTIMATE_FALLBACK)
}

impl Cache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_items.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            config,
            stats: Mutex::new(CacheStats::default()),
            sweep_handle: Mutex::new(None),
        }
    }

    /// Starts a background task that evicts expired entries every 60 seconds,
    /// so a cache that's gone quiet doesn't hold stale entries until the next
    /// `get` happens to probe them. Must be called from within a Tokio
    /// runtime; `Cache::new` spawns nothing so it stays usable from plain
    /// `#[test]` functions. Call `close` to stop the sweep.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        if self.config.ttl_ms <= 0 {
            return;
        }
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep_expired();
            }
        });
        *self.sweep_handle.lock() = Some(handle);
    }

    /// Stops the background sweep task, if one was started. Idle entries
    /// persist in the cache after this; they'll still expire lazily on `get`.
    pub fn close(&self) {
        if let Some(handle) = self.sweep_handle.lock().take() {
            handle.abort();
        }
    }

    fn sweep_expired(&self) {
        let now = now_ms();
        let mut entries = self.entries.lock();
        let expired: Vec<StorageKey> = entries
            .iter()
            .filter(|(_, entry)| Self::entry_expired(entry, now))
            .map(|(k, _)| k.clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        let mut reclaimed = 0u64;
        for key in &expired {
            if let Some(entry) = entries.pop(key) {
                reclaimed += entry.size_bytes;
            }
        }
        if self.config.enable_stats {
            let mut stats = self.stats.lock();
            stats.expirations += expired.len() as u64;
            stats.size_bytes = stats.size_bytes.saturating_sub(reclaimed);
            stats.item_count = entries.len() as u64;
        }
    }

    fn entry_ttl(&self, override_ttl_ms: Option<i64>) -> i64 {
        override_ttl_ms.unwrap_or(self.config.ttl_ms)
    }

    fn entry_expired(entry: &CacheEntry, now: i64) -> bool {
        entry.ttl_ms > 0 && now.saturating_sub(entry.inserted_at_ms) >= entry.ttl_ms
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        Self::entry_expired(entry, now)
    }

    pub fn get(&self, key: &StorageKey) -> Option<Value> {
        let now = now_ms();
        let mut entries = self.entries.lock();
        let expired = matches!(entries.peek(key), Some(entry) if self.is_expired(entry, now));
        if expired {
            entries.pop(key);
            if self.config.enable_stats {
                let mut stats = self.stats.lock();
                stats.expirations += 1;
                stats.misses += 1;
            }
            return None;
        }

        let hit = entries.get(key).map(|entry| entry.value.clone());
        if self.config.enable_stats {
            let mut stats = self.stats.lock();
            if hit.is_some() {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }
        hit
    }

    /// Checks whether `key` has a live, unexpired entry without recording a
    /// hit or miss and without cloning the stored value.
    pub fn has(&self, key: &StorageKey) -> bool {
        let now = now_ms();
        let entries = self.entries.lock();
        matches!(entries.peek(key), Some(entry) if !self.is_expired(entry, now))
    }

    fn insert(&self, key: StorageKey, value: Value, ttl_ms: Option<i64>) {
        let size_bytes = estimate_size(&value);
        let entry = CacheEntry {
            value,
            inserted_at_ms: now_ms(),
            ttl_ms: self.entry_ttl(ttl_ms),
            size_bytes,
        };

        let mut entries = self.entries.lock();
        if let Some(old) = entries.put(key, entry) {
            if self.config.enable_stats {
                let mut stats = self.stats.lock();
                stats.size_bytes = stats.size_bytes.saturating_sub(old.size_bytes);
            }
        }

        let mut current_bytes: u64 = entries.iter().map(|(_, e)| e.size_bytes).sum();
        let mut evicted = 0u64;
        while current_bytes > self.config.max_size_bytes && entries.len() > 1 {
            if let Some((_, evicted_entry)) = entries.pop_lru() {
                current_bytes = current_bytes.saturating_sub(evicted_entry.size_bytes);
                evicted += 1;
            } else {
                break;
            }
        }

        if self.config.enable_stats {
            let mut stats = self.stats.lock();
            stats.evictions += evicted;
            stats.size_bytes = current_bytes;
            stats.item_count = entries.len() as u64;
        }
    }

    pub fn set(&self, key: StorageKey, value: Value) {
        self.insert(key, value, None);
    }

    /// Like [`Cache::set`], but overrides the cache-wide TTL for this entry
    /// alone. A `ttl_ms` of `0` means the entry never expires, regardless of
    /// the cache's configured default.
    pub fn set_with_ttl(&self, key: StorageKey, value: Value, ttl_ms: i64) {
        self.insert(key, value, Some(ttl_ms));
    }

    pub fn set_batch(&self, entries: HashMap<StorageKey, Value>) {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Alias for [`Cache::set_batch`] used to pre-populate a cold cache, e.g.
    /// right after [`crate::manager::StorageManager::initialize`].
    pub fn warmup(&self, entries: HashMap<StorageKey, Value>) {
        self.set_batch(entries);
    }

    pub fn get_batch(&self, keys: &[StorageKey]) -> HashMap<StorageKey, Option<Value>> {
        keys.iter().map(|key| (key.clone(), self.get(key))).collect()
    }

    /// Snapshot of the keys currently resident and unexpired, in the lru
    /// crate's most-recently-used-first order.
    pub fn keys(&self) -> Vec<StorageKey> {
        let now = now_ms();
        let entries = self.entries.lock();
        entries
            .iter()
            .filter(|(_, entry)| !Self::entry_expired(entry, now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn delete(&self, key: &StorageKey) -> bool {
        let mut entries = self.entries.lock();
        let removed = entries.pop(key);
        if let Some(entry) = removed {
            if self.config.enable_stats {
                let mut stats = self.stats.lock();
                stats.size_bytes = stats.size_bytes.saturating_sub(entry.size_bytes);
                stats.item_count = entries.len() as u64;
            }
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        if self.config.enable_stats {
            *self.stats.lock() = CacheStats::default();
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        let mut stats = self.stats.lock();
        let item_count = stats.item_count;
        let size_bytes = stats.size_bytes;
        *stats = CacheStats {
            item_count,
            size_bytes,
            ..CacheStats::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn key(s: &str) -> StorageKey {
        StorageKey::new(s).unwrap()
    }

    #[test]
    fn hits_and_misses_are_counted() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 0,
            enable_stats: true,
        });
        assert!(cache.get(&key("default:a")).is_none());
        cache.set(key("default:a"), serde_json::json!("value"));
        assert!(cache.get(&key("default:a")).is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 10,
            enable_stats: true,
        });
        cache.set(key("default:a"), serde_json::json!(1));
        sleep(StdDuration::from_millis(30));
        assert!(cache.get(&key("default:a")).is_none());
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn eviction_respects_byte_budget() {
        let cache = Cache::new(CacheConfig {
            max_items: 100,
            max_size_bytes: 10,
            ttl_ms: 0,
            enable_stats: true,
        });
        cache.set(key("default:a"), serde_json::json!("aaaaaaaaaa"));
        cache.set(key("default:b"), serde_json::json!("bbbbbbbbbb"));
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn delete_removes_entry_and_updates_stats() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 0,
            enable_stats: true,
        });
        cache.set(key("default:a"), serde_json::json!(1));
        assert!(cache.delete(&key("default:a")));
        assert!(!cache.delete(&key("default:a")));
        assert_eq!(cache.stats().item_count, 0);
    }

    #[test]
    fn per_entry_ttl_overrides_the_cache_default() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 0,
            enable_stats: true,
        });
        cache.set_with_ttl(key("default:a"), serde_json::json!(1), 10);
        assert!(cache.has(&key("default:a")));
        sleep(StdDuration::from_millis(30));
        assert!(!cache.has(&key("default:a")));
    }

    #[test]
    fn batch_set_and_get_round_trip_multiple_keys() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 0,
            enable_stats: true,
        });
        let mut entries = HashMap::new();
        entries.insert(key("default:a"), serde_json::json!(1));
        entries.insert(key("default:b"), serde_json::json!(2));
        cache.warmup(entries);

        let fetched = cache.get_batch(&[key("default:a"), key("default:b"), key("default:c")]);
        assert_eq!(fetched[&key("default:a")], Some(serde_json::json!(1)));
        assert_eq!(fetched[&key("default:b")], Some(serde_json::json!(2)));
        assert_eq!(fetched[&key("default:c")], None);
    }

    #[test]
    fn keys_excludes_expired_entries() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 0,
            enable_stats: true,
        });
        cache.set(key("default:a"), serde_json::json!(1));
        cache.set_with_ttl(key("default:b"), serde_json::json!(2), 10);
        sleep(StdDuration::from_millis(30));
        assert_eq!(cache.keys(), vec![key("default:a")]);
    }

    #[test]
    fn reset_stats_clears_counters_but_not_size() {
        let cache = Cache::new(CacheConfig {
            max_items: 10,
            max_size_bytes: 1_000_000,
            ttl_ms: 0,
            enable_stats: true,
        });
        cache.set(key("default:a"), serde_json::json!(1));
        cache.get(&key("default:a"));
        cache.get(&key("default:missing"));
        cache.reset_stats();
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.item_count, 1);
    }
}
