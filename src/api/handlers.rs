//! API Handlers
//!
//! HTTP request handlers for the taxonomy families and the cache itself.
//! Every family route is parameterised by `:family` (`categories`,
//! `subcategories`, `collections`, `genders`).

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::interceptor::CachedJson;
use crate::cache::{CacheStore, MemoryBackend, ReadThroughCache, TtlPolicy};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{
    BulkCreateRequest, CacheStatsResponse, DeleteResponse, HealthResponse, SortOrderRequest,
    StatusRequest, ValidateParams,
};
use crate::taxonomy::{
    Availability, FamilyStats, GenderIndex, InMemoryRepository, ListQuery, NewTaxon, Page, Taxon,
    TaxonPatch, TaxonWithChildren, TaxonomyRepository, TaxonomyService, TaxonomyServices,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Per-family services over the shared read-through cache
    pub services: TaxonomyServices,
    /// The shared cache store, also swept by the cleanup task
    pub cache: Arc<RwLock<CacheStore>>,
    /// Whether the cache header interceptor is installed
    pub cache_headers: bool,
}

impl AppState {
    /// Wires the services to one shared store and the given repository.
    pub fn new(store: CacheStore, repo: Arc<dyn TaxonomyRepository>, ttl: TtlPolicy) -> Self {
        let backend = MemoryBackend::new(store);
        let cache = backend.shared();
        let read_through = ReadThroughCache::new(Arc::new(backend), ttl);
        Self {
            services: TaxonomyServices::new(repo, read_through),
            cache,
            cache_headers: true,
        }
    }

    /// Creates a new AppState from configuration, backed by the in-memory
    /// repository.
    pub fn from_config(config: &Config) -> Self {
        let store = CacheStore::new(config.max_entries);
        let repo: Arc<dyn TaxonomyRepository> = Arc::new(InMemoryRepository::new());
        Self {
            cache_headers: config.http_cache_headers,
            ..Self::new(store, repo, config.ttl_policy())
        }
    }

    fn service(&self, family: &str) -> Result<&TaxonomyService> {
        Ok(self.services.family(family.parse()?))
    }
}

// == Reads ==

pub async fn list_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<CachedJson<Page<Taxon>>> {
    let lookup = state.service(&family)?.list(query).await?;
    Ok(CachedJson(lookup))
}

pub async fn get_handler(
    State(state): State<AppState>,
    Path((family, id)): Path<(String, Uuid)>,
) -> Result<CachedJson<Taxon>> {
    let lookup = state.service(&family)?.get_by_id(id).await?;
    Ok(CachedJson(lookup))
}

pub async fn by_slug_handler(
    State(state): State<AppState>,
    Path((family, slug)): Path<(String, String)>,
) -> Result<CachedJson<Taxon>> {
    let lookup = state.service(&family)?.get_by_slug(&slug).await?;
    Ok(CachedJson(lookup))
}

pub async fn stats_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
) -> Result<CachedJson<FamilyStats>> {
    let lookup = state.service(&family)?.stats().await?;
    Ok(CachedJson(lookup))
}

pub async fn by_gender_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
) -> Result<CachedJson<GenderIndex>> {
    let lookup = state.service(&family)?.by_gender().await?;
    Ok(CachedJson(lookup))
}

pub async fn with_children_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
) -> Result<CachedJson<Vec<TaxonWithChildren>>> {
    let lookup = state.service(&family)?.with_children().await?;
    Ok(CachedJson(lookup))
}

pub async fn validate_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Query(params): Query<ValidateParams>,
) -> Result<CachedJson<Availability>> {
    let lookup = state
        .service(&family)?
        .validate(&params.name, params.slug.as_deref(), params.exclude_id)
        .await?;
    Ok(CachedJson(lookup))
}

// == Writes ==

pub async fn create_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Json(input): Json<NewTaxon>,
) -> Result<(StatusCode, Json<Taxon>)> {
    let created = state.service(&family)?.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn bulk_create_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Json(req): Json<BulkCreateRequest>,
) -> Result<(StatusCode, Json<Vec<Taxon>>)> {
    let created = state.service(&family)?.bulk_create(req.items).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_handler(
    State(state): State<AppState>,
    Path((family, id)): Path<(String, Uuid)>,
    Json(patch): Json<TaxonPatch>,
) -> Result<Json<Taxon>> {
    if patch.is_empty() {
        return Err(ServiceError::InvalidRequest("No fields to update".to_string()));
    }
    let updated = state.service(&family)?.update(id, patch).await?;
    Ok(Json(updated))
}

pub async fn status_handler(
    State(state): State<AppState>,
    Path((family, id)): Path<(String, Uuid)>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Taxon>> {
    let updated = state.service(&family)?.update_status(id, req.status).await?;
    Ok(Json(updated))
}

pub async fn sort_order_handler(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Json(req): Json<SortOrderRequest>,
) -> Result<Json<Vec<Taxon>>> {
    let updated = state.service(&family)?.update_sort_order(req.items).await?;
    Ok(Json(updated))
}

/// Handler for DELETE /:id (soft delete)
pub async fn soft_delete_handler(
    State(state): State<AppState>,
    Path((family, id)): Path<(String, Uuid)>,
) -> Result<Json<Taxon>> {
    let deleted = state.service(&family)?.soft_delete(id).await?;
    Ok(Json(deleted))
}

pub async fn hard_delete_handler(
    State(state): State<AppState>,
    Path((family, id)): Path<(String, Uuid)>,
) -> Result<Json<DeleteResponse>> {
    let service = state.service(&family)?;
    service.hard_delete(id).await?;
    Ok(Json(DeleteResponse::new(service.family().label(), id)))
}

pub async fn restore_handler(
    State(state): State<AppState>,
    Path((family, id)): Path<(String, Uuid)>,
) -> Result<Json<Taxon>> {
    let restored = state.service(&family)?.restore(id).await?;
    Ok(Json(restored))
}

// == Service Endpoints ==

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    // Read lock only: stats inspection must not disturb LRU order
    let stats = state.cache.read().await.stats();
    Json(CacheStatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
