//! Cache Store Module
//!
//! Expiring key-value map with lazy expiry, prefix deletion and an LRU
//! capacity bound.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{is_valid_key, CacheEntry, CacheStats, Clock, LruTracker, SystemClock};
use crate::error::{CacheError, CacheResult};

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Time source for stamping and expiring entries
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store bounded to `max_entries` using wall-clock time.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_secs` seconds, replacing any
    /// existing entry.
    ///
    /// A zero TTL is rejected rather than stored already-expired. When the
    /// store is full the least recently used entry is evicted.
    pub fn set(&mut self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
        if !is_valid_key(key) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        if ttl_secs == 0 {
            return Err(CacheError::InvalidTtl(key.to_string()));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::ValueTooLarge {
                key: key.to_string(),
                size: value.len(),
            });
        }

        let is_overwrite = self.entries.contains_key(key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
            }
        }

        let entry = CacheEntry::new(value, ttl_secs, self.clock.now_ms());
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Returns the value for `key` if present and unexpired.
    ///
    /// An expired entry is removed on the read that discovers it.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Contains ==
    /// Reports whether an unexpired entry exists without touching stats,
    /// recency or the entry itself.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Raw inspection: true if the map holds `key`, expired or not.
    pub fn holds_raw(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remaining TTL in seconds for an unexpired entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Delete ==
    /// Removes `key`. Deleting an absent key is not an error.
    ///
    /// Returns whether an entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.record_invalidations(1);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Delete Prefix ==
    /// Removes every key starting with `prefix`, returning how many went.
    pub fn delete_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_invalidations(doomed.len());
        self.stats.set_total_entries(self.entries.len());
        doomed.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
