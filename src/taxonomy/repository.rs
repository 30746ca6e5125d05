//! Persistence accessor contract
//!
//! What the family services need from the document store. Reads are
//! idempotent; writes return the entity as it is after the write.

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::taxonomy::{
    EntityFamily, GroupDimension, ListQuery, NewTaxon, Page, SortOrderUpdate, Status, Taxon,
    TaxonPatch,
};

#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    /// Inserts a new entity. `input.slug` must already be resolved.
    async fn create(&self, family: EntityFamily, input: NewTaxon) -> Result<Taxon>;

    async fn find_page(&self, family: EntityFamily, query: &ListQuery) -> Result<Page<Taxon>>;

    /// Every entity matching the query's filters, sorted, without paging.
    async fn find_all(&self, family: EntityFamily, query: &ListQuery) -> Result<Vec<Taxon>>;

    /// Live (not soft-deleted) entity by id.
    async fn find_by_id(&self, family: EntityFamily, id: Uuid) -> Result<Option<Taxon>>;

    /// Live entity by slug.
    async fn find_by_slug(&self, family: EntityFamily, slug: &str) -> Result<Option<Taxon>>;

    async fn update(&self, family: EntityFamily, id: Uuid, patch: TaxonPatch) -> Result<Taxon>;

    async fn soft_delete(&self, family: EntityFamily, id: Uuid) -> Result<Taxon>;

    /// Removes the entity for good, soft-deleted or not.
    async fn hard_delete(&self, family: EntityFamily, id: Uuid) -> Result<Taxon>;

    async fn restore(&self, family: EntityFamily, id: Uuid) -> Result<Taxon>;

    async fn update_status(&self, family: EntityFamily, id: Uuid, status: Status) -> Result<Taxon>;

    /// Applies every update or none; returns the updated entities.
    async fn bulk_update_sort_order(
        &self,
        family: EntityFamily,
        updates: &[SortOrderUpdate],
    ) -> Result<Vec<Taxon>>;

    /// True if any entity other than `exclude_id` carries the name
    /// (case-insensitive) or the slug. Soft-deleted entities count.
    async fn exists(
        &self,
        family: EntityFamily,
        name: Option<&str>,
        slug: Option<&str>,
        exclude_id: Option<Uuid>,
    ) -> Result<bool>;

    /// Live entity counts keyed by the dimension's value; entities without
    /// a value for the dimension are counted under `none`.
    async fn count_by_group(
        &self,
        family: EntityFamily,
        dimension: GroupDimension,
    ) -> Result<BTreeMap<String, u64>>;

    /// Number of soft-deleted entities.
    async fn count_deleted(&self, family: EntityFamily) -> Result<u64>;
}
