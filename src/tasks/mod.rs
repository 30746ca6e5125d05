//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries so idle keys do not linger
//!   until their next lookup

mod cleanup;

pub use cleanup::spawn_cleanup_task;
