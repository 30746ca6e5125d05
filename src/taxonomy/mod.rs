//! Taxonomy Module
//!
//! Entity families (categories, subcategories, collections, genders), their
//! persistence contract and the cached family services built on top.

pub mod keys;
mod memory;
mod models;
mod repository;
mod service;
pub mod validation;

pub use keys::{invalidation_plan, ViewKey};
pub use memory::InMemoryRepository;
pub use models::*;
pub use repository::TaxonomyRepository;
pub use service::{TaxonomyService, TaxonomyServices};
pub use validation::{check_availability, slugify, suggest_unique_slug, MAX_SLUG_ATTEMPTS};
