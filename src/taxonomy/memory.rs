//! In-memory persistence accessor
//!
//! A `TaxonomyRepository` over a map guarded by an async lock. Enforces the
//! same uniqueness rules a document store index would.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::taxonomy::{
    EntityFamily, GroupDimension, ListQuery, NewTaxon, Page, SortDirection, SortField,
    SortOrderUpdate, Status, Taxon, TaxonPatch, TaxonomyRepository,
};

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rows: RwLock<HashMap<Uuid, Taxon>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

fn not_found(family: EntityFamily, id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{} with id {} not found", family.label(), id))
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Conflict if another row of `family` already uses `name` or `slug`.
fn check_unique(
    rows: &HashMap<Uuid, Taxon>,
    family: EntityFamily,
    name: Option<&str>,
    slug: Option<&str>,
    exclude_id: Option<Uuid>,
) -> Result<()> {
    for row in rows.values() {
        if row.family != family || Some(row.id) == exclude_id {
            continue;
        }
        if let Some(name) = name.filter(|n| same_name(n, &row.name)) {
            return Err(ServiceError::Conflict(format!(
                "{} with name '{}' already exists",
                family.label(),
                name.trim()
            )));
        }
        if let Some(slug) = slug.filter(|s| *s == row.slug) {
            return Err(ServiceError::Conflict(format!(
                "{} with slug '{}' already exists",
                family.label(),
                slug
            )));
        }
    }
    Ok(())
}

fn compare(a: &Taxon, b: &Taxon, field: SortField) -> Ordering {
    let primary = match field {
        SortField::SortOrder => a.sort_order.cmp(&b.sort_order),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    primary
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

fn select(rows: &HashMap<Uuid, Taxon>, family: EntityFamily, query: &ListQuery) -> Vec<Taxon> {
    let mut matched: Vec<Taxon> = rows
        .values()
        .filter(|row| row.family == family && query.matches(row))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        let ord = compare(a, b, query.sort_by);
        match query.sort_dir {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    matched
}

/// Live row of `family` with `id`, mutably.
fn live_mut(
    rows: &mut HashMap<Uuid, Taxon>,
    family: EntityFamily,
    id: Uuid,
) -> Result<&mut Taxon> {
    rows.get_mut(&id)
        .filter(|row| row.family == family && !row.is_deleted())
        .ok_or_else(|| not_found(family, id))
}

#[async_trait]
impl TaxonomyRepository for InMemoryRepository {
    async fn create(&self, family: EntityFamily, input: NewTaxon) -> Result<Taxon> {
        let slug = input
            .slug
            .ok_or_else(|| ServiceError::InvalidRequest("Slug is required".to_string()))?;

        let mut rows = self.rows.write().await;
        check_unique(&rows, family, Some(&input.name), Some(&slug), None)?;

        let now = Utc::now();
        let taxon = Taxon {
            id: Uuid::new_v4(),
            family,
            name: input.name.trim().to_string(),
            slug,
            description: input.description,
            parent_id: input.parent_id,
            gender: input.gender,
            status: input.status.unwrap_or(Status::Active),
            sort_order: input.sort_order.unwrap_or(0),
            image_url: input.image_url,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.insert(taxon.id, taxon.clone());
        Ok(taxon)
    }

    async fn find_page(&self, family: EntityFamily, query: &ListQuery) -> Result<Page<Taxon>> {
        let rows = self.rows.read().await;
        let matched = select(&rows, family, query);
        let total = matched.len() as u64;
        let skip = (query.page.saturating_sub(1) as usize).saturating_mul(query.limit as usize);
        let items = matched
            .into_iter()
            .skip(skip)
            .take(query.limit as usize)
            .collect();
        Ok(Page::new(items, total, query.page, query.limit))
    }

    async fn find_all(&self, family: EntityFamily, query: &ListQuery) -> Result<Vec<Taxon>> {
        let rows = self.rows.read().await;
        Ok(select(&rows, family, query))
    }

    async fn find_by_id(&self, family: EntityFamily, id: Uuid) -> Result<Option<Taxon>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&id)
            .filter(|row| row.family == family && !row.is_deleted())
            .cloned())
    }

    async fn find_by_slug(&self, family: EntityFamily, slug: &str) -> Result<Option<Taxon>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|row| row.family == family && row.slug == slug && !row.is_deleted())
            .cloned())
    }

    async fn update(&self, family: EntityFamily, id: Uuid, patch: TaxonPatch) -> Result<Taxon> {
        let mut rows = self.rows.write().await;
        live_mut(&mut rows, family, id)?;
        check_unique(
            &rows,
            family,
            patch.name.as_deref(),
            patch.slug.as_deref(),
            Some(id),
        )?;

        let row = live_mut(&mut rows, family, id)?;
        if let Some(name) = patch.name {
            row.name = name.trim().to_string();
        }
        if let Some(slug) = patch.slug {
            row.slug = slug;
        }
        if patch.description.is_some() {
            row.description = patch.description;
        }
        if patch.parent_id.is_some() {
            row.parent_id = patch.parent_id;
        }
        if patch.gender.is_some() {
            row.gender = patch.gender;
        }
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(sort_order) = patch.sort_order {
            row.sort_order = sort_order;
        }
        if patch.image_url.is_some() {
            row.image_url = patch.image_url;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn soft_delete(&self, family: EntityFamily, id: Uuid) -> Result<Taxon> {
        let mut rows = self.rows.write().await;
        let row = live_mut(&mut rows, family, id)?;
        let now = Utc::now();
        row.deleted_at = Some(now);
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn hard_delete(&self, family: EntityFamily, id: Uuid) -> Result<Taxon> {
        let mut rows = self.rows.write().await;
        match rows.get(&id) {
            Some(row) if row.family == family => {}
            _ => return Err(not_found(family, id)),
        }
        rows.remove(&id).ok_or_else(|| not_found(family, id))
    }

    async fn restore(&self, family: EntityFamily, id: Uuid) -> Result<Taxon> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .filter(|row| row.family == family)
            .ok_or_else(|| not_found(family, id))?;
        if !row.is_deleted() {
            return Err(ServiceError::Conflict(format!(
                "{} with id {} is not deleted",
                family.label(),
                id
            )));
        }
        row.deleted_at = None;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn update_status(&self, family: EntityFamily, id: Uuid, status: Status) -> Result<Taxon> {
        let mut rows = self.rows.write().await;
        let row = live_mut(&mut rows, family, id)?;
        row.status = status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn bulk_update_sort_order(
        &self,
        family: EntityFamily,
        updates: &[SortOrderUpdate],
    ) -> Result<Vec<Taxon>> {
        let mut rows = self.rows.write().await;
        for update in updates {
            live_mut(&mut rows, family, update.id)?;
        }

        let now = Utc::now();
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let row = live_mut(&mut rows, family, update.id)?;
            row.sort_order = update.sort_order;
            row.updated_at = now;
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn exists(
        &self,
        family: EntityFamily,
        name: Option<&str>,
        slug: Option<&str>,
        exclude_id: Option<Uuid>,
    ) -> Result<bool> {
        let rows = self.rows.read().await;
        Ok(check_unique(&rows, family, name, slug, exclude_id).is_err())
    }

    async fn count_by_group(
        &self,
        family: EntityFamily,
        dimension: GroupDimension,
    ) -> Result<BTreeMap<String, u64>> {
        let rows = self.rows.read().await;
        let mut counts = BTreeMap::new();
        for row in rows
            .values()
            .filter(|row| row.family == family && !row.is_deleted())
        {
            let group = match dimension {
                GroupDimension::Gender => row.gender.map_or("none", |g| g.as_str()),
                GroupDimension::Status => row.status.as_str(),
            };
            *counts.entry(group.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_deleted(&self, family: EntityFamily) -> Result<u64> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| row.family == family && row.is_deleted())
            .count() as u64)
    }
}
