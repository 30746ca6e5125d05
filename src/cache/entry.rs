//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A serialized payload and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value (JSON text)
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms` that lives for `ttl_seconds`.
    pub fn new(value: String, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now_ms`.
    ///
    /// Boundary condition: an entry is expired once `now_ms >= expires_at`,
    /// so it is gone the instant its TTL has fully elapsed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Returns remaining TTL in whole seconds.
    pub fn ttl_remaining(&self, now_ms: u64) -> u64 {
        self.ttl_remaining_ms(now_ms) / 1000
    }
}
