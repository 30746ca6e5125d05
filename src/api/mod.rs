//! API Module
//!
//! HTTP handlers, routing and the cache header interceptor for the
//! taxonomy REST API. See [`create_router`] for the endpoint list.

pub mod handlers;
pub mod interceptor;
pub mod routes;

pub use handlers::*;
pub use interceptor::{cache_headers, CacheOutcome, CachedJson};
pub use routes::create_router;
