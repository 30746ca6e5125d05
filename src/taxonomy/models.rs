//! Taxonomy Models
//!
//! Entities, filters and aggregate views shared by every entity family.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

/// Default page size for list views
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a caller may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

// == Entity Family ==
/// Kind of taxonomy entity. Each family has its own cache namespace and
/// its own name/slug uniqueness scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityFamily {
    #[serde(rename = "categories")]
    Category,
    #[serde(rename = "subcategories")]
    Subcategory,
    #[serde(rename = "collections")]
    Collection,
    #[serde(rename = "genders")]
    Gender,
}

impl EntityFamily {
    pub const ALL: [EntityFamily; 4] = [
        EntityFamily::Category,
        EntityFamily::Subcategory,
        EntityFamily::Collection,
        EntityFamily::Gender,
    ];

    /// Plural name used in routes, message patterns and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityFamily::Category => "categories",
            EntityFamily::Subcategory => "subcategories",
            EntityFamily::Collection => "collections",
            EntityFamily::Gender => "genders",
        }
    }

    /// Singular label for messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityFamily::Category => "Category",
            EntityFamily::Subcategory => "Subcategory",
            EntityFamily::Collection => "Collection",
            EntityFamily::Gender => "Gender",
        }
    }

    /// Family whose entities list this family's entities as children.
    pub fn parent(&self) -> Option<EntityFamily> {
        match self {
            EntityFamily::Subcategory => Some(EntityFamily::Category),
            _ => None,
        }
    }

    /// Family whose entities hang below this one.
    pub fn child(&self) -> Option<EntityFamily> {
        match self {
            EntityFamily::Category => Some(EntityFamily::Subcategory),
            _ => None,
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityFamily {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityFamily::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidRequest(format!("Unknown entity family: {}", s)))
    }
}

// == Gender ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
    Unisex,
    Kids,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
            Gender::Unisex => "unisex",
            Gender::Kids => "kids",
        }
    }
}

// == Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

// == Taxon ==
/// One taxonomy entity of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    pub id: Uuid,
    pub family: EntityFamily,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Owning entity in the parent family (subcategory -> category)
    pub parent_id: Option<Uuid>,
    pub gender: Option<Gender>,
    pub status: Status,
    pub sort_order: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Taxon {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// == New Taxon ==
/// Creation payload. A missing slug is derived from the name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTaxon {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewTaxon {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns an error message if the payload is unusable.
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name).or_else(|| self.slug.as_deref().and_then(validate_slug))
    }
}

// == Taxon Patch ==
/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl TaxonPatch {
    pub fn validate(&self) -> Option<String> {
        self.name
            .as_deref()
            .and_then(validate_name)
            .or_else(|| self.slug.as_deref().and_then(validate_slug))
    }

    pub fn is_empty(&self) -> bool {
        *self == TaxonPatch::default()
    }
}

pub const MAX_SLUG_LENGTH: usize = 120;

fn validate_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Some("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 100 {
        return Some("Name exceeds maximum length of 100 characters".to_string());
    }
    None
}

fn validate_slug(slug: &str) -> Option<String> {
    if slug.is_empty() {
        return Some("Slug cannot be empty".to_string());
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Some(format!(
            "Slug exceeds maximum length of {} characters",
            MAX_SLUG_LENGTH
        ));
    }
    let well_formed = slug
        .split('-')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    if !well_formed {
        return Some(format!(
            "Slug '{}' must be lowercase letters and digits separated by single hyphens",
            slug
        ));
    }
    None
}

// == Sorting ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    SortOrder,
    Name,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::SortOrder => "sort_order",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

// == List Query ==
/// Filtering, sorting and paging for list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<Status>,
    pub gender: Option<Gender>,
    pub parent_id: Option<Uuid>,
    /// Case-insensitive substring match on name or slug
    pub search: Option<String>,
    pub include_deleted: bool,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            status: None,
            gender: None,
            parent_id: None,
            search: None,
            include_deleted: false,
            sort_by: SortField::default(),
            sort_dir: SortDirection::default(),
        }
    }
}

impl ListQuery {
    /// Clamps paging into range and drops blank search terms.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.search = self
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self
    }

    /// True if `taxon` passes every filter in this query.
    pub fn matches(&self, taxon: &Taxon) -> bool {
        if !self.include_deleted && taxon.is_deleted() {
            return false;
        }
        if self.status.is_some_and(|s| s != taxon.status) {
            return false;
        }
        if self.gender.is_some() && self.gender != taxon.gender {
            return false;
        }
        if self.parent_id.is_some() && self.parent_id != taxon.parent_id {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !taxon.name.to_lowercase().contains(&term) && !taxon.slug.contains(&term) {
                return false;
            }
        }
        true
    }
}

// == Page ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

// == Aggregate Views ==
/// Grouping dimension for `count_by_group`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    Gender,
    Status,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub deleted: u64,
    pub by_gender: BTreeMap<String, u64>,
}

/// Live entities of one family bucketed by gender; `none` holds those
/// without one.
pub type GenderIndex = BTreeMap<String, Vec<Taxon>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonWithChildren {
    #[serde(flatten)]
    pub taxon: Taxon,
    pub children: Vec<Taxon>,
}

// == Availability ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub name_available: bool,
    pub slug_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_slug: Option<String>,
    pub messages: Vec<String>,
}

/// New sort position for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrderUpdate {
    pub id: Uuid,
    pub sort_order: i32,
}
