//! Invalidation Module
//!
//! Best-effort removal of a set of keys and key prefixes after a write.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::ReadThroughCache;

// == Invalidation Plan ==
/// Exact keys and prefixes to drop after one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub prefixes: Vec<String>,
    pub keys: Vec<String>,
}

impl InvalidationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Folds another plan into this one.
    pub fn merge(mut self, other: InvalidationPlan) -> Self {
        for prefix in other.prefixes {
            self = self.prefix(prefix);
        }
        for key in other.keys {
            self = self.key(key);
        }
        self
    }
}

// == Invalidation Outcome ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationOutcome {
    /// Entries actually removed
    pub removed: usize,
    /// Deletions that failed and were skipped
    pub failed: usize,
}

impl ReadThroughCache {
    // == Invalidate ==
    /// Runs every deletion in `plan` concurrently.
    ///
    /// Never fails: each failed deletion is logged at `warn` and counted.
    /// The write that triggered this has already committed.
    pub async fn invalidate(&self, plan: &InvalidationPlan) -> InvalidationOutcome {
        let backend = self.backend();

        let prefix_deletes = plan.prefixes.iter().map(|prefix| async move {
            backend
                .delete_prefix(prefix)
                .await
                .map_err(|e| (prefix.as_str(), e))
        });
        let key_deletes = plan.keys.iter().map(|key| async move {
            backend
                .delete(key)
                .await
                .map(usize::from)
                .map_err(|e| (key.as_str(), e))
        });

        let (prefix_results, key_results) =
            futures::join!(join_all(prefix_deletes), join_all(key_deletes));

        let mut outcome = InvalidationOutcome::default();
        for result in prefix_results.into_iter().chain(key_results) {
            match result {
                Ok(removed) => outcome.removed += removed,
                Err((entry, e)) => {
                    warn!(entry, error = %e, "cache invalidation failed");
                    outcome.failed += 1;
                }
            }
        }

        debug!(
            removed = outcome.removed,
            failed = outcome.failed,
            "cache invalidation complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, CacheStats, CacheStore, MemoryBackend, TtlPolicy};
    use crate::error::{CacheError, CacheResult};
    use async_trait::async_trait;
    use std::sync::Arc;

    #[test]
    fn test_plan_deduplicates() {
        let plan = InvalidationPlan::new()
            .prefix("categories:all")
            .prefix("categories:all")
            .key("categories:by_id:1")
            .merge(InvalidationPlan::new().key("categories:by_id:1").key("x"));

        assert_eq!(plan.prefixes, vec!["categories:all".to_string()]);
        assert_eq!(
            plan.keys,
            vec!["categories:by_id:1".to_string(), "x".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalidate_removes_keys_and_prefixes() {
        let backend = MemoryBackend::new(CacheStore::new(100));
        let cache = ReadThroughCache::new(Arc::new(backend.clone()), TtlPolicy::default());

        for key in [
            "categories:all:page:1",
            "categories:all:page:2",
            "categories:stats",
            "categories:by_id:7",
            "collections:stats",
        ] {
            backend.set(key, "1".to_string(), 60).await.unwrap();
        }

        let plan = InvalidationPlan::new()
            .prefix("categories:all")
            .prefix("categories:stats")
            .key("categories:by_id:7")
            .key("categories:by_id:missing");
        let outcome = cache.invalidate(&plan).await;

        assert_eq!(outcome, InvalidationOutcome { removed: 4, failed: 0 });
        assert!(backend.contains("collections:stats").await.unwrap());
        assert_eq!(backend.stats().await.unwrap().total_entries, 1);
    }

    /// Reads fine, refuses every deletion.
    struct ReadOnlyBackend(MemoryBackend);

    #[async_trait]
    impl CacheBackend for ReadOnlyBackend {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            self.0.get(key).await
        }
        async fn set(&self, key: &str, value: String, ttl: u64) -> CacheResult<()> {
            self.0.set(key, value, ttl).await
        }
        async fn delete(&self, _key: &str) -> CacheResult<bool> {
            Err(CacheError::Unavailable("read-only replica".into()))
        }
        async fn delete_prefix(&self, _prefix: &str) -> CacheResult<usize> {
            Err(CacheError::Unavailable("read-only replica".into()))
        }
        async fn contains(&self, key: &str) -> CacheResult<bool> {
            self.0.contains(key).await
        }
        async fn ttl_remaining(&self, key: &str) -> CacheResult<Option<u64>> {
            self.0.ttl_remaining(key).await
        }
        async fn stats(&self) -> CacheResult<CacheStats> {
            self.0.stats().await
        }
    }

    #[tokio::test]
    async fn test_failed_deletions_are_counted_not_raised() {
        let memory = MemoryBackend::new(CacheStore::new(100));
        memory.set("genders:stats", "1".to_string(), 60).await.unwrap();
        let cache = ReadThroughCache::new(
            Arc::new(ReadOnlyBackend(memory.clone())),
            TtlPolicy::default(),
        );

        let plan = InvalidationPlan::new()
            .prefix("genders:all")
            .prefix("genders:stats")
            .key("genders:by_id:1")
            .key("genders:by_slug:kids");
        let outcome = cache.invalidate(&plan).await;

        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.failed, plan.prefixes.len() + plan.keys.len());
        assert!(memory.contains("genders:stats").await.unwrap());
    }
}
