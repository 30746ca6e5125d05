//! Cache Module
//!
//! Expiring in-memory store, key builder, TTL policy, read-through wrapper
//! and invalidation fan-out shared by every entity family.

mod backend;
mod clock;
mod entry;
mod invalidation;
mod key;
mod lru;
mod read_through;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use backend::{CacheBackend, MemoryBackend};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use invalidation::{InvalidationOutcome, InvalidationPlan};
pub use key::{build_key, escape_component, is_valid_key, ParamBag, DEFAULT_SEPARATOR, MAX_KEY_LENGTH};
pub use lru::LruTracker;
pub use read_through::{CacheStatus, Lookup, ReadThroughCache};
pub use stats::CacheStats;
pub use store::{CacheStore, MAX_VALUE_SIZE};
pub use ttl::{TtlClass, TtlPolicy};
