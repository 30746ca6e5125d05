//! Category Service - cached taxonomy catalogue
//!
//! Categories, subcategories, collections and genders behind a shared
//! read-through cache with per-class TTLs and invalidation on every write.
//! Served over HTTP and over a message-pattern transport.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod messaging;
pub mod models;
pub mod taxonomy;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use messaging::{spawn_message_consumer, MessageClient, MessageDispatcher};
pub use tasks::spawn_cleanup_task;
