//! API Routes
//!
//! Configures the Axum router with the family endpoints and service endpoints.

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    by_gender_handler, by_slug_handler, bulk_create_handler, cache_stats_handler, create_handler,
    get_handler, hard_delete_handler, health_handler, list_handler, restore_handler,
    soft_delete_handler, sort_order_handler, stats_handler, status_handler, update_handler,
    validate_handler, with_children_handler, AppState,
};
use super::interceptor::cache_headers;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// Under `/api/v1/:family`:
/// - `POST /`, `GET /` - create, paged list
/// - `GET /stats`, `GET /by-gender`, `GET /with-children`, `GET /validate`
/// - `POST /bulk`, `PATCH /sort-order`
/// - `GET /slug/:slug`
/// - `GET|PATCH|DELETE /:id`, `PATCH /:id/status`, `DELETE /:id/permanent`,
///   `POST /:id/restore`
///
/// Plus `GET /health` and `GET /cache/stats`.
///
/// # Middleware
/// - Cache headers: `x-cache` / `cache-control` from read-through outcomes
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let families = Router::new()
        .route("/api/v1/:family", post(create_handler).get(list_handler))
        .route("/api/v1/:family/stats", get(stats_handler))
        .route("/api/v1/:family/by-gender", get(by_gender_handler))
        .route("/api/v1/:family/with-children", get(with_children_handler))
        .route("/api/v1/:family/validate", get(validate_handler))
        .route("/api/v1/:family/bulk", post(bulk_create_handler))
        .route("/api/v1/:family/sort-order", patch(sort_order_handler))
        .route("/api/v1/:family/slug/:slug", get(by_slug_handler))
        .route(
            "/api/v1/:family/:id",
            get(get_handler)
                .patch(update_handler)
                .delete(soft_delete_handler),
        )
        .route("/api/v1/:family/:id/status", patch(status_handler))
        .route("/api/v1/:family/:id/permanent", delete(hard_delete_handler))
        .route("/api/v1/:family/:id/restore", post(restore_handler));

    let families = if state.cache_headers {
        families.layer(middleware::from_fn(cache_headers))
    } else {
        families
    };

    Router::new()
        .merge(families)
        .route("/cache/stats", get(cache_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
