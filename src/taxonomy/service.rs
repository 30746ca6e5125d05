//! Family service
//!
//! CRUD for one entity family. Reads go through the shared read-through
//! cache; writes validate, hit the repository, then invalidate.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{InvalidationPlan, Lookup, ReadThroughCache};
use crate::error::{Result, ServiceError};
use crate::taxonomy::keys::{invalidation_plan, ViewKey};
use crate::taxonomy::validation::{check_availability, slugify};
use crate::taxonomy::{
    Availability, EntityFamily, FamilyStats, GenderIndex, GroupDimension, ListQuery, NewTaxon,
    Page, SortOrderUpdate, Status, Taxon, TaxonPatch, TaxonWithChildren, TaxonomyRepository,
};

// == Taxonomy Service ==
#[derive(Clone)]
pub struct TaxonomyService {
    family: EntityFamily,
    repo: Arc<dyn TaxonomyRepository>,
    cache: ReadThroughCache,
}

impl TaxonomyService {
    pub fn new(
        family: EntityFamily,
        repo: Arc<dyn TaxonomyRepository>,
        cache: ReadThroughCache,
    ) -> Self {
        Self {
            family,
            repo,
            cache,
        }
    }

    pub fn family(&self) -> EntityFamily {
        self.family
    }

    fn not_found(&self, what: impl std::fmt::Display) -> ServiceError {
        ServiceError::NotFound(format!("{} with {} not found", self.family.label(), what))
    }

    // == Reads ==

    pub async fn list(&self, query: ListQuery) -> Result<Lookup<Page<Taxon>>> {
        let query = query.normalized();
        let view = ViewKey::All(&query);
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || {
                self.repo.find_page(self.family, &query)
            })
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Lookup<Taxon>> {
        let view = ViewKey::ById(id);
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || async {
                self.repo
                    .find_by_id(self.family, id)
                    .await?
                    .ok_or_else(|| self.not_found(format_args!("id {}", id)))
            })
            .await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Lookup<Taxon>> {
        let view = ViewKey::BySlug(slug);
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || async {
                self.repo
                    .find_by_slug(self.family, slug)
                    .await?
                    .ok_or_else(|| self.not_found(format_args!("slug '{}'", slug)))
            })
            .await
    }

    pub async fn stats(&self) -> Result<Lookup<FamilyStats>> {
        let view = ViewKey::Stats;
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || async {
                let by_status = self
                    .repo
                    .count_by_group(self.family, GroupDimension::Status)
                    .await?;
                let by_gender = self
                    .repo
                    .count_by_group(self.family, GroupDimension::Gender)
                    .await?;
                let deleted = self.repo.count_deleted(self.family).await?;

                let active = by_status.get(Status::Active.as_str()).copied().unwrap_or(0);
                let inactive = by_status.get(Status::Inactive.as_str()).copied().unwrap_or(0);
                Ok(FamilyStats {
                    total: active + inactive,
                    active,
                    inactive,
                    deleted,
                    by_gender,
                })
            })
            .await
    }

    pub async fn by_gender(&self) -> Result<Lookup<GenderIndex>> {
        let view = ViewKey::ByGender;
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || async {
                let live = self.repo.find_all(self.family, &ListQuery::default()).await?;
                let mut index = GenderIndex::new();
                for taxon in live {
                    let group = taxon.gender.map_or("none", |g| g.as_str());
                    index.entry(group.to_string()).or_default().push(taxon);
                }
                Ok(index)
            })
            .await
    }

    pub async fn with_children(&self) -> Result<Lookup<Vec<TaxonWithChildren>>> {
        let view = ViewKey::WithChildren;
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || async {
                let parents = self.repo.find_all(self.family, &ListQuery::default()).await?;
                let children = match self.family.child() {
                    Some(child) => self.repo.find_all(child, &ListQuery::default()).await?,
                    None => Vec::new(),
                };

                Ok(parents
                    .into_iter()
                    .map(|taxon| {
                        let children = children
                            .iter()
                            .filter(|c| c.parent_id == Some(taxon.id))
                            .cloned()
                            .collect();
                        TaxonWithChildren { taxon, children }
                    })
                    .collect())
            })
            .await
    }

    /// Availability of a name and slug; the slug defaults to the name's slug.
    pub async fn validate(
        &self,
        name: &str,
        slug: Option<&str>,
        exclude_id: Option<Uuid>,
    ) -> Result<Lookup<Availability>> {
        let slug = checked_slug(&NewTaxon {
            slug: slug.map(str::to_string),
            ..NewTaxon::named(name)
        })?;
        let view = ViewKey::Availability {
            name,
            slug: &slug,
            exclude_id,
        };
        self.cache
            .get_or_load(&view.build(self.family), view.ttl_class(), || {
                check_availability(self.repo.as_ref(), self.family, name, &slug, exclude_id)
            })
            .await
    }

    // == Writes ==

    pub async fn create(&self, input: NewTaxon) -> Result<Taxon> {
        let input = self.prepare_new(input).await?;
        let created = self.repo.create(self.family, input).await?;
        info!(family = %self.family, id = %created.id, slug = %created.slug, "created");

        self.invalidate(Some(&created), None).await;
        Ok(created)
    }

    /// Creates every entity or none. The batch is validated as a whole,
    /// including duplicates inside the batch, before anything is written.
    pub async fn bulk_create(&self, inputs: Vec<NewTaxon>) -> Result<Vec<Taxon>> {
        if inputs.is_empty() {
            return Err(ServiceError::InvalidRequest("Batch is empty".to_string()));
        }

        let mut prepared = Vec::with_capacity(inputs.len());
        let mut names = HashSet::new();
        let mut slugs = HashSet::new();
        for input in inputs {
            let input = self.prepare_new(input).await?;
            let slug = input.slug.clone().unwrap_or_default();
            if !names.insert(input.name.trim().to_lowercase()) || !slugs.insert(slug.clone()) {
                return Err(ServiceError::Conflict(format!(
                    "Duplicate {} '{}' in batch",
                    self.family.label(),
                    slug
                )));
            }
            prepared.push(input);
        }

        let mut created = Vec::with_capacity(prepared.len());
        let mut failure = None;
        for input in prepared {
            match self.repo.create(self.family, input).await {
                Ok(taxon) => created.push(taxon),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let plan = created.iter().fold(InvalidationPlan::new(), |plan, taxon| {
            plan.merge(invalidation_plan(self.family, Some(taxon), None))
        });
        self.cache.invalidate(&plan).await;

        match failure {
            Some(e) => {
                warn!(family = %self.family, created = created.len(), error = %e, "bulk create stopped early");
                Err(e)
            }
            None => {
                info!(family = %self.family, count = created.len(), "bulk created");
                Ok(created)
            }
        }
    }

    pub async fn update(&self, id: Uuid, patch: TaxonPatch) -> Result<Taxon> {
        if let Some(msg) = patch.validate() {
            return Err(ServiceError::InvalidRequest(msg));
        }
        let existing = self
            .repo
            .find_by_id(self.family, id)
            .await?
            .ok_or_else(|| self.not_found(format_args!("id {}", id)))?;

        let name = patch.name.as_deref().unwrap_or(&existing.name);
        let slug = patch.slug.as_deref().unwrap_or(&existing.slug);
        if patch.name.is_some() || patch.slug.is_some() {
            let availability =
                check_availability(self.repo.as_ref(), self.family, name, slug, Some(id)).await?;
            ensure_available(&availability)?;
        }
        if patch.parent_id.is_some() {
            self.check_parent(patch.parent_id).await?;
        }

        let updated = self.repo.update(self.family, id, patch).await?;
        info!(family = %self.family, id = %id, "updated");

        let previous_slug = (existing.slug != updated.slug).then_some(existing.slug.as_str());
        self.invalidate(Some(&updated), previous_slug).await;
        Ok(updated)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<Taxon> {
        let deleted = self.repo.soft_delete(self.family, id).await?;
        info!(family = %self.family, id = %id, "soft-deleted");
        self.invalidate(Some(&deleted), None).await;
        Ok(deleted)
    }

    pub async fn hard_delete(&self, id: Uuid) -> Result<Taxon> {
        let removed = self.repo.hard_delete(self.family, id).await?;
        info!(family = %self.family, id = %id, "permanently deleted");
        self.invalidate(Some(&removed), None).await;
        Ok(removed)
    }

    pub async fn restore(&self, id: Uuid) -> Result<Taxon> {
        let restored = self.repo.restore(self.family, id).await?;
        info!(family = %self.family, id = %id, "restored");
        self.invalidate(Some(&restored), None).await;
        Ok(restored)
    }

    pub async fn update_status(&self, id: Uuid, status: Status) -> Result<Taxon> {
        let updated = self.repo.update_status(self.family, id, status).await?;
        info!(family = %self.family, id = %id, status = status.as_str(), "status changed");
        self.invalidate(Some(&updated), None).await;
        Ok(updated)
    }

    pub async fn update_sort_order(&self, updates: Vec<SortOrderUpdate>) -> Result<Vec<Taxon>> {
        if updates.is_empty() {
            return Err(ServiceError::InvalidRequest("No sort order updates given".to_string()));
        }
        let updated = self
            .repo
            .bulk_update_sort_order(self.family, &updates)
            .await?;

        let plan = updated.iter().fold(InvalidationPlan::new(), |plan, taxon| {
            plan.merge(invalidation_plan(self.family, Some(taxon), None))
        });
        self.cache.invalidate(&plan).await;
        info!(family = %self.family, count = updated.len(), "sort order updated");
        Ok(updated)
    }

    // == Helpers ==

    /// Drops every cached view a write to this family can affect.
    pub async fn invalidate(&self, entity: Option<&Taxon>, previous_slug: Option<&str>) {
        let plan = invalidation_plan(self.family, entity, previous_slug);
        self.cache.invalidate(&plan).await;
    }

    /// Validates a creation payload, resolves its slug and checks conflicts.
    async fn prepare_new(&self, mut input: NewTaxon) -> Result<NewTaxon> {
        let slug = checked_slug(&input)?;
        let availability =
            check_availability(self.repo.as_ref(), self.family, &input.name, &slug, None).await?;
        ensure_available(&availability)?;
        self.check_parent(input.parent_id).await?;

        input.slug = Some(slug);
        Ok(input)
    }

    /// A parent is required to be a live entity of the parent family, and
    /// only families with a parent family may name one.
    async fn check_parent(&self, parent_id: Option<Uuid>) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        let Some(parent_family) = self.family.parent() else {
            return Err(ServiceError::InvalidRequest(format!(
                "{} cannot have a parent",
                self.family.label()
            )));
        };
        match self.repo.find_by_id(parent_family, parent_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::InvalidRequest(format!(
                "Parent {} with id {} not found",
                parent_family.label(),
                parent_id
            ))),
        }
    }
}

/// Validates the name and explicit slug, then returns the slug to use.
fn checked_slug(input: &NewTaxon) -> Result<String> {
    if let Some(msg) = input.validate() {
        return Err(ServiceError::InvalidRequest(msg));
    }
    let slug = match &input.slug {
        Some(slug) => slug.clone(),
        None => slugify(&input.name),
    };
    if slug.is_empty() {
        return Err(ServiceError::InvalidRequest(format!(
            "Cannot derive a slug from name '{}'",
            input.name
        )));
    }
    Ok(slug)
}

fn ensure_available(availability: &Availability) -> Result<()> {
    if availability.name_available && availability.slug_available {
        Ok(())
    } else {
        Err(ServiceError::Conflict(availability.messages.join("; ")))
    }
}

// == Taxonomy Services ==
/// One service per family, all sharing a repository and a cache.
#[derive(Clone)]
pub struct TaxonomyServices {
    categories: TaxonomyService,
    subcategories: TaxonomyService,
    collections: TaxonomyService,
    genders: TaxonomyService,
    cache: ReadThroughCache,
}

impl TaxonomyServices {
    pub fn new(repo: Arc<dyn TaxonomyRepository>, cache: ReadThroughCache) -> Self {
        let service = |family| TaxonomyService::new(family, repo.clone(), cache.clone());
        Self {
            categories: service(EntityFamily::Category),
            subcategories: service(EntityFamily::Subcategory),
            collections: service(EntityFamily::Collection),
            genders: service(EntityFamily::Gender),
            cache: cache.clone(),
        }
    }

    pub fn family(&self, family: EntityFamily) -> &TaxonomyService {
        match family {
            EntityFamily::Category => &self.categories,
            EntityFamily::Subcategory => &self.subcategories,
            EntityFamily::Collection => &self.collections,
            EntityFamily::Gender => &self.genders,
        }
    }

    pub fn cache(&self) -> &ReadThroughCache {
        &self.cache
    }
}
