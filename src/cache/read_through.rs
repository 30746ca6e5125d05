//! Read-Through Cache Module
//!
//! Answers reads from the backend when possible, otherwise runs the loader
//! and stores what it returned.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheStats, TtlClass, TtlPolicy};
use crate::error::CacheResult;

// == Cache Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

// == Lookup ==
/// A value together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub status: CacheStatus,
    pub class: TtlClass,
    /// Seconds the value stays fresh: the class TTL on a miss, what is
    /// left of the stored entry's TTL on a hit
    pub ttl_secs: u64,
}

impl<T> Lookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        Lookup {
            value: f(self.value),
            status: self.status,
            class: self.class,
            ttl_secs: self.ttl_secs,
        }
    }
}

// == Read-Through Cache ==
/// Shared handle used by every entity family.
#[derive(Clone)]
pub struct ReadThroughCache {
    backend: Arc<dyn CacheBackend>,
    ttl: TtlPolicy,
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ReadThroughCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: TtlPolicy) -> Self {
        Self { backend, ttl }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ttl
    }

    // == Get Or Load ==
    /// Returns the cached value for `key`, or runs `load` and caches its result.
    ///
    /// Cache failures (backend errors, undecodable payloads) degrade to a miss.
    /// Loader errors are returned as-is and nothing is stored for `key`.
    /// Concurrent misses on one key each run the loader; the last write wins.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &str,
        class: TtlClass,
        load: F,
    ) -> Result<Lookup<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ttl_secs = self.ttl.seconds(class);

        if let Some(value) = self.lookup::<T>(key).await {
            debug!(key, "cache hit");
            return Ok(Lookup {
                value,
                status: CacheStatus::Hit,
                class,
                ttl_secs: self.remaining(key, ttl_secs).await,
            });
        }

        debug!(key, "cache miss");
        let value = load().await?;
        self.populate(key, &value, ttl_secs).await;

        Ok(Lookup {
            value,
            status: CacheStatus::Miss,
            class,
            ttl_secs,
        })
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached payload undecodable, dropping entry");
                if let Err(e) = self.backend.delete(key).await {
                    warn!(key, error = %e, "failed to drop undecodable entry");
                }
                None
            }
        }
    }

    /// Remaining TTL of a hit, capped by the class TTL. Falls back to the
    /// class TTL when the backend cannot tell.
    async fn remaining(&self, key: &str, class_ttl: u64) -> u64 {
        match self.backend.ttl_remaining(key).await {
            Ok(Some(secs)) => secs.clamp(1, class_ttl.max(1)),
            Ok(None) => class_ttl,
            Err(e) => {
                warn!(key, error = %e, "cache ttl lookup failed");
                class_ttl
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value for cache");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, raw, ttl_secs).await {
            warn!(key, error = %e, "cache write failed");
        }
    }

    /// Cache status of `key` without counting a lookup; `None` if the
    /// backend could not say.
    pub async fn is_cached(&self, key: &str) -> Option<bool> {
        match self.backend.contains(key).await {
            Ok(present) => Some(present),
            Err(e) => {
                warn!(key, error = %e, "cache inspection failed");
                None
            }
        }
    }

    pub async fn stats(&self) -> CacheResult<CacheStats> {
        self.backend.stats().await
    }
}
