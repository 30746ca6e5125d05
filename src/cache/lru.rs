//! LRU Tracker Module
//!
//! Access ordering used to pick an eviction victim once the store is full.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access recency with a monotonically increasing tick.
///
/// Every touch stamps the key with the next tick; the smallest tick is the
/// least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Next tick to hand out
    tick: u64,
    /// Key -> tick of its latest access
    ticks: HashMap<String, u64>,
    /// Tick -> key, ordered oldest first
    order: BTreeMap<u64, String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        let tick = self.tick;
        self.tick += 1;
        self.ticks.insert(key.to_string(), tick);
        self.order.insert(tick, key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and forgets the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Returns the least recently used key without removing it.
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.values().next()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn test_lru_oldest_is_first_touched() {
        let mut lru = LruTracker::new();

        lru.touch("categories:stats");
        lru.touch("categories:by_gender");
        lru.touch("collections:stats");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"categories:stats".to_string()));
    }

    #[test]
    fn test_lru_retouch_moves_to_newest() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::new();
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");
        lru.remove("key2");
        lru.remove("missing");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key2"));
        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert_eq!(lru.evict_oldest(), Some("key3".to_string()));
    }

    #[test]
    fn test_lru_touch_same_key_repeatedly() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key1");
        lru.touch("key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert!(lru.is_empty());
    }
}
