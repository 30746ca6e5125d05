//! Cache keys for taxonomy views
//!
//! Every cached read names its key through `ViewKey`, so the shape of each
//! operation's key is fixed in one place.

use uuid::Uuid;

use crate::cache::{build_key, escape_component, InvalidationPlan, ParamBag, TtlClass};
use crate::taxonomy::{EntityFamily, ListQuery, Taxon};

const ALL: &str = "all";
const BY_ID: &str = "by_id";
const BY_SLUG: &str = "by_slug";
const STATS: &str = "stats";
const BY_GENDER: &str = "by_gender";
const WITH_CHILDREN: &str = "with_children";
const VALIDATE: &str = "validate";

/// Views that describe a family as a whole; any write can change them.
const FAMILY_VIEWS: [&str; 5] = [ALL, STATS, BY_GENDER, WITH_CHILDREN, VALIDATE];

// == View Key ==
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewKey<'a> {
    All(&'a ListQuery),
    ById(Uuid),
    BySlug(&'a str),
    Stats,
    ByGender,
    WithChildren,
    Availability {
        name: &'a str,
        slug: &'a str,
        exclude_id: Option<Uuid>,
    },
}

impl ViewKey<'_> {
    /// TTL class the view is cached under.
    pub fn ttl_class(&self) -> TtlClass {
        match self {
            ViewKey::All(_) | ViewKey::ByGender | ViewKey::WithChildren => TtlClass::List,
            ViewKey::ById(_) | ViewKey::BySlug(_) => TtlClass::Detail,
            ViewKey::Stats => TtlClass::Stats,
            ViewKey::Availability { .. } => TtlClass::Validation,
        }
    }

    /// Builds the key inside `family`'s namespace.
    pub fn build(&self, family: EntityFamily) -> String {
        match self {
            ViewKey::All(query) => {
                let bag = ParamBag::new()
                    .param("page", query.page)
                    .param("limit", query.limit)
                    .opt_param("status", query.status.map(|s| s.as_str()))
                    .opt_param("gender", query.gender.map(|g| g.as_str()))
                    .opt_param("parent", query.parent_id.map(|id| id.to_string()))
                    .opt_param("search", query.search.clone())
                    .opt_param("deleted", query.include_deleted.then_some(true))
                    .param("sort", query.sort_by.as_str())
                    .param("dir", query.sort_dir.as_str());
                build_key(&base(family, ALL), &bag)
            }
            ViewKey::ById(id) => format!("{}:{}", base(family, BY_ID), id),
            ViewKey::BySlug(slug) => format!("{}:{}", base(family, BY_SLUG), escape_component(slug)),
            ViewKey::Stats => base(family, STATS),
            ViewKey::ByGender => base(family, BY_GENDER),
            ViewKey::WithChildren => base(family, WITH_CHILDREN),
            ViewKey::Availability {
                name,
                slug,
                exclude_id,
            } => {
                let bag = ParamBag::new()
                    .param("name", name.trim().to_lowercase())
                    .param("slug", *slug)
                    .opt_param("exclude", exclude_id.map(|id| id.to_string()));
                build_key(&base(family, VALIDATE), &bag)
            }
        }
    }
}

fn base(family: EntityFamily, view: &str) -> String {
    format!("{}:{}", family.as_str(), view)
}

// == Invalidation ==
/// Keys to drop after a write to `family`.
///
/// Family-wide views are dropped by prefix so every parameterized variant
/// goes with them. Detail keys are dropped exactly, for the entity's id and
/// for every slug it has carried (`previous_slug` on renames). A write to a
/// child family also drops the parent family's with-children view.
pub fn invalidation_plan(
    family: EntityFamily,
    entity: Option<&Taxon>,
    previous_slug: Option<&str>,
) -> InvalidationPlan {
    let mut plan = FAMILY_VIEWS
        .iter()
        .fold(InvalidationPlan::new(), |plan, view| {
            plan.prefix(base(family, view))
        });

    if let Some(taxon) = entity {
        plan = plan
            .key(ViewKey::ById(taxon.id).build(family))
            .key(ViewKey::BySlug(&taxon.slug).build(family));
    }
    if let Some(slug) = previous_slug {
        plan = plan.key(ViewKey::BySlug(slug).build(family));
    }
    if let Some(parent) = family.parent() {
        plan = plan.prefix(base(parent, WITH_CHILDREN));
    }

    plan
}
