//! Request and response models shared by the HTTP and message surfaces
//!
//! Entity payloads (`NewTaxon`, `TaxonPatch`, `ListQuery`) live with the
//! taxonomy model; this module holds the envelopes around them.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    BulkCreateRequest, IdRequest, IdStatusRequest, SlugRequest, SortOrderRequest, StatusRequest,
    UpdateRequest, ValidateParams,
};
pub use responses::{CacheStatsResponse, DeleteResponse, HealthResponse};
