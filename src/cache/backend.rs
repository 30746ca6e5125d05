//! Cache Backend Module
//!
//! The seam between read-through/invalidation logic and the storage behind it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore};
use crate::error::CacheResult;

// == Backend Trait ==
/// Storage used by the read-through cache.
///
/// Every method may fail; callers decide whether a failure is fatal. The
/// read-through wrapper and invalidation never let these errors escape.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the stored value, `None` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value for `ttl_secs` seconds.
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()>;

    /// Removes a key; absent keys are not an error.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Removes every key starting with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize>;

    /// True if an unexpired entry exists. Does not count as a lookup.
    async fn contains(&self, key: &str) -> CacheResult<bool>;

    /// Whole seconds left before `key` expires, `None` when absent.
    async fn ttl_remaining(&self, key: &str) -> CacheResult<Option<u64>>;

    async fn stats(&self) -> CacheResult<CacheStats>;
}

// == Memory Backend ==
/// Backend over one process-wide `CacheStore`.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: Arc<RwLock<CacheStore>>,
}

impl MemoryBackend {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Shares an existing store, e.g. with the cleanup task.
    pub fn from_shared(store: Arc<RwLock<CacheStore>>) -> Self {
        Self { store }
    }

    pub fn shared(&self) -> Arc<RwLock<CacheStore>> {
        self.store.clone()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        // Write lock: a read may evict, and always updates recency/stats
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
        self.store.write().await.set(key, value, ttl_secs)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.store.write().await.delete(key))
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        Ok(self.store.write().await.delete_prefix(prefix))
    }

    async fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.store.read().await.contains(key))
    }

    async fn ttl_remaining(&self, key: &str) -> CacheResult<Option<u64>> {
        Ok(self.store.read().await.ttl_remaining(key))
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Ok(self.store.read().await.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new(CacheStore::new(10));

        backend.set("genders:stats", "{}".to_string(), 60).await.unwrap();
        assert!(backend.contains("genders:stats").await.unwrap());
        assert_eq!(backend.ttl_remaining("genders:stats").await.unwrap(), Some(60));
        assert_eq!(
            backend.get("genders:stats").await.unwrap().as_deref(),
            Some("{}")
        );

        assert!(backend.delete("genders:stats").await.unwrap());
        assert!(!backend.delete("genders:stats").await.unwrap());
        assert!(backend.get("genders:stats").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_backend_shares_store() {
        let backend = MemoryBackend::new(CacheStore::new(10));
        let other = MemoryBackend::from_shared(backend.shared());

        backend.set("a:1", "x".to_string(), 60).await.unwrap();
        backend.set("a:2", "y".to_string(), 60).await.unwrap();

        assert_eq!(other.delete_prefix("a:").await.unwrap(), 2);
        assert_eq!(backend.stats().await.unwrap().total_entries, 0);
    }
}
