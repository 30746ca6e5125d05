//! Name and slug availability
//!
//! Slug derivation, unique-slug suggestion and the availability check used
//! both by the validate endpoint and by create/update.

use tracing::debug;
use uuid::Uuid;

use crate::cache::current_timestamp_ms;
use crate::error::Result;
use crate::taxonomy::{Availability, EntityFamily, TaxonomyRepository, MAX_SLUG_LENGTH};

/// Numbered suffixes tried before falling back to a timestamp
pub const MAX_SLUG_ATTEMPTS: u32 = 100;

// == Slugify ==
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single hyphen, trimming hyphens at both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

// == Suggest Unique Slug ==
/// First free slug among `base-1` ..= `base-100`, else `base-<unix millis>`.
/// The base is shortened as needed to keep every candidate within
/// [`MAX_SLUG_LENGTH`].
pub async fn suggest_unique_slug(
    repo: &dyn TaxonomyRepository,
    family: EntityFamily,
    base: &str,
    exclude_id: Option<Uuid>,
) -> Result<String> {
    for n in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = with_suffix(base, n);
        if !repo.exists(family, None, Some(&candidate), exclude_id).await? {
            return Ok(candidate);
        }
    }

    let fallback = with_suffix(base, current_timestamp_ms());
    debug!(family = %family, base, fallback, "numbered slugs exhausted");
    Ok(fallback)
}

fn with_suffix(base: &str, suffix: impl std::fmt::Display) -> String {
    let suffix = suffix.to_string();
    let mut end = base.len().min(MAX_SLUG_LENGTH.saturating_sub(suffix.len() + 1));
    while !base.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}-{}", base[..end].trim_end_matches('-'), suffix)
}

// == Check Availability ==
/// Reports whether `name` and `slug` are free in `family`.
///
/// With `exclude_id`, that entity's own name and slug do not count as
/// conflicts, so an entity can keep them across an update.
pub async fn check_availability(
    repo: &dyn TaxonomyRepository,
    family: EntityFamily,
    name: &str,
    slug: &str,
    exclude_id: Option<Uuid>,
) -> Result<Availability> {
    let name_taken = repo.exists(family, Some(name), None, exclude_id).await?;
    let slug_taken = repo.exists(family, None, Some(slug), exclude_id).await?;

    let mut messages = Vec::new();
    if name_taken {
        messages.push(format!(
            "{} name '{}' is already in use",
            family.label(),
            name.trim()
        ));
    }

    let suggested_slug = if slug_taken {
        messages.push(format!("{} slug '{}' is already in use", family.label(), slug));
        Some(suggest_unique_slug(repo, family, slug, exclude_id).await?)
    } else {
        None
    };

    Ok(Availability {
        name_available: !name_taken,
        slug_available: !slug_taken,
        suggested_slug,
        messages,
    })
}
