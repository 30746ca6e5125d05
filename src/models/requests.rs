//! Request DTOs
//!
//! Bodies and query strings that wrap taxonomy payloads.

use serde::Deserialize;
use uuid::Uuid;

use crate::taxonomy::{NewTaxon, SortOrderUpdate, Status, TaxonPatch};

/// Query for `GET /validate` and the `validate` message.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateParams {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Entity being edited; its own name and slug do not conflict
    #[serde(default)]
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateRequest {
    pub items: Vec<NewTaxon>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortOrderRequest {
    pub items: Vec<SortOrderUpdate>,
}

/// Message payload addressing one entity.
#[derive(Debug, Clone, Deserialize)]
pub struct IdRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlugRequest {
    pub slug: String,
}

/// Message payload for updates: the id next to the patch fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub patch: TaxonPatch,
}

/// Message payload for status changes.
#[derive(Debug, Clone, Deserialize)]
pub struct IdStatusRequest {
    pub id: Uuid,
    pub status: Status,
}
