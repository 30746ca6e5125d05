//! Configuration Module
//!
//! Loads server and cache settings from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::TtlPolicy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the shared cache can hold
    pub max_entries: usize,
    /// Seconds between expired-entry sweeps; 0 disables the sweep
    pub cleanup_interval: u64,
    /// TTL in seconds for list and grouped views
    pub ttl_list: u64,
    /// TTL in seconds for single-entity lookups
    pub ttl_detail: u64,
    /// TTL in seconds for aggregate statistics
    pub ttl_stats: u64,
    /// TTL in seconds for name/slug availability answers
    pub ttl_validation: u64,
    /// Whether read responses carry `x-cache` and `cache-control` headers
    pub http_cache_headers: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds, 0 to disable (default: 60)
    /// - `TTL_LIST` / `TTL_DETAIL` / `TTL_STATS` / `TTL_VALIDATION` - per-class
    ///   TTLs in seconds (defaults: 300 / 600 / 900 / 60)
    /// - `HTTP_CACHE_HEADERS` - `true` or `false` (default: true)
    ///
    /// Unparseable values, a zero `MAX_ENTRIES` and zero TTLs fall back to
    /// the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_entries: nonzero_or("MAX_ENTRIES", defaults.max_entries),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            ttl_list: nonzero_or("TTL_LIST", defaults.ttl_list),
            ttl_detail: nonzero_or("TTL_DETAIL", defaults.ttl_detail),
            ttl_stats: nonzero_or("TTL_STATS", defaults.ttl_stats),
            ttl_validation: nonzero_or("TTL_VALIDATION", defaults.ttl_validation),
            http_cache_headers: env_or("HTTP_CACHE_HEADERS", defaults.http_cache_headers),
        }
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            list: self.ttl_list,
            detail: self.ttl_detail,
            stats: self.ttl_stats,
            validation: self.ttl_validation,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Like [`env_or`], but a zero also means "use the default".
fn nonzero_or<T: FromStr + Default + PartialEq + Copy>(name: &str, default: T) -> T {
    match env_or(name, default) {
        value if value == T::default() => default,
        value => value,
    }
}

impl Default for Config {
    fn default() -> Self {
        let ttl = TtlPolicy::default();
        Self {
            server_port: 3000,
            max_entries: 1000,
            cleanup_interval: 60,
            ttl_list: ttl.list,
            ttl_detail: ttl.detail,
            ttl_stats: ttl.stats,
            ttl_validation: ttl.validation,
            http_cache_headers: true,
        }
    }
}
