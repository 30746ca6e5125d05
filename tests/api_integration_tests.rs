//! Integration Tests for API Endpoints
//!
//! Full request/response cycles through the router, including the cache
//! headers produced by the read-through cache.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use category_service::{
    api::create_router,
    cache::{CacheStore, TtlPolicy},
    taxonomy::InMemoryRepository,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::new(
            CacheStore::new(1000),
            Arc::new(InMemoryRepository::new()),
            TtlPolicy::default(),
        );
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.send("GET", uri, None).await
    }

    async fn create(&self, family: &str, body: Value) -> Value {
        let response = self
            .send("POST", &format!("/api/v1/{}", family), Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_to_json(response).await
    }

    async fn cached(&self, key: &str) -> bool {
        self.state.cache.read().await.contains(key)
    }
}

async fn body_to_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn x_cache(response: &Response<Body>) -> &str {
    response.headers()["x-cache"].to_str().unwrap()
}

// == Read-Through Tests ==

#[tokio::test]
async fn test_detail_read_miss_then_hit() {
    let app = TestApp::new();
    let shoes = app.create("categories", json!({"name": "Shoes"})).await;
    let uri = format!("/api/v1/categories/{}", shoes["id"].as_str().unwrap());

    let first = app.get(&uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), "MISS");
    assert_eq!(first.headers()["cache-control"], "public, max-age=600");

    let second = app.get(&uri).await;
    assert_eq!(x_cache(&second), "HIT");
    let max_age: u64 = second.headers()["cache-control"]
        .to_str()
        .unwrap()
        .trim_start_matches("public, max-age=")
        .parse()
        .unwrap();
    assert!((1..=600).contains(&max_age));
    assert_eq!(body_to_json(second).await, shoes);
}

#[tokio::test]
async fn test_list_pages_are_cached_separately() {
    let app = TestApp::new();
    for name in ["Shoes", "Bags", "Hats"] {
        app.create("categories", json!({"name": name})).await;
    }

    let page1 = app.get("/api/v1/categories?page=1&limit=2").await;
    assert_eq!(x_cache(&page1), "MISS");
    assert_eq!(page1.headers()["cache-control"], "public, max-age=300");
    let page1 = body_to_json(page1).await;
    assert_eq!(page1["items"].as_array().unwrap().len(), 2);
    assert_eq!(page1["total_pages"], 2);

    let page2 = app.get("/api/v1/categories?page=2&limit=2").await;
    assert_eq!(x_cache(&page2), "MISS");
    assert_eq!(body_to_json(page2).await["items"].as_array().unwrap().len(), 1);

    assert!(app.cached("categories:all:page:1:limit:2:sort:sort_order:dir:asc").await);
    assert!(app.cached("categories:all:page:2:limit:2:sort:sort_order:dir:asc").await);

    let again = app.get("/api/v1/categories?page=1&limit=2").await;
    assert_eq!(x_cache(&again), "HIT");
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let app = TestApp::new();
    let id = "6f1c2f9e-8a4b-4c0e-9d55-0c9f3b6f2a11";

    let response = app.get(&format!("/api/v1/categories/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-cache").is_none());
    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("not found"));

    assert!(!app.cached(&format!("categories:by_id:{}", id)).await);
}

// == Invalidation Tests ==

#[tokio::test]
async fn test_update_invalidates_family_views_and_old_slug() {
    let app = TestApp::new();
    let shoes = app.create("categories", json!({"name": "Shoes"})).await;
    let id = shoes["id"].as_str().unwrap();

    app.get("/api/v1/categories").await;
    app.get("/api/v1/categories/stats").await;
    app.get("/api/v1/categories/by-gender").await;
    app.get("/api/v1/categories/with-children").await;
    app.get(&format!("/api/v1/categories/{}", id)).await;
    app.get("/api/v1/categories/slug/shoes").await;
    assert!(app.cached("categories:stats").await);
    assert!(app.cached("categories:by_slug:shoes").await);

    let response = app
        .send(
            "PATCH",
            &format!("/api/v1/categories/{}", id),
            Some(json!({"name": "Footwear", "slug": "footwear"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-store");

    assert!(!app.cached("categories:all:page:1:limit:10:sort:sort_order:dir:asc").await);
    assert!(!app.cached("categories:stats").await);
    assert!(!app.cached("categories:by_gender").await);
    assert!(!app.cached("categories:with_children").await);
    assert!(!app.cached(&format!("categories:by_id:{}", id)).await);
    assert!(!app.cached("categories:by_slug:shoes").await);

    let old_slug = app.get("/api/v1/categories/slug/shoes").await;
    assert_eq!(old_slug.status(), StatusCode::NOT_FOUND);

    let detail = app.get(&format!("/api/v1/categories/{}", id)).await;
    assert_eq!(x_cache(&detail), "MISS");
    assert_eq!(body_to_json(detail).await["name"], "Footwear");
}

#[tokio::test]
async fn test_writes_to_one_family_leave_others_cached() {
    let app = TestApp::new();
    app.get("/api/v1/genders/stats").await;

    app.create("collections", json!({"name": "Summer"})).await;

    let stats = app.get("/api/v1/genders/stats").await;
    assert_eq!(x_cache(&stats), "HIT");
}

#[tokio::test]
async fn test_subcategory_appears_under_parent() {
    let app = TestApp::new();
    let shoes = app.create("categories", json!({"name": "Shoes"})).await;

    let tree = body_to_json(app.get("/api/v1/categories/with-children").await).await;
    assert_eq!(tree[0]["children"], json!([]));

    app.create(
        "subcategories",
        json!({"name": "Sneakers", "parent_id": shoes["id"]}),
    )
    .await;

    let response = app.get("/api/v1/categories/with-children").await;
    assert_eq!(x_cache(&response), "MISS");
    let tree = body_to_json(response).await;
    assert_eq!(tree[0]["name"], "Shoes");
    assert_eq!(tree[0]["children"][0]["slug"], "sneakers");
}

// == Validation Tests ==

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let app = TestApp::new();
    app.create("categories", json!({"name": "Shoes"})).await;

    let response = app
        .send("POST", "/api/v1/categories", Some(json!({"name": "SHOES"})))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("already in use"));
}

#[tokio::test]
async fn test_validate_endpoint() {
    let app = TestApp::new();
    let shoes = app.create("categories", json!({"name": "Shoes"})).await;

    let taken = app.get("/api/v1/categories/validate?name=Shoes").await;
    assert_eq!(taken.status(), StatusCode::OK);
    assert_eq!(taken.headers()["cache-control"], "public, max-age=60");
    let taken = body_to_json(taken).await;
    assert_eq!(taken["name_available"], false);
    assert_eq!(taken["slug_available"], false);
    assert_eq!(taken["suggested_slug"], "shoes-1");

    let own = app
        .get(&format!(
            "/api/v1/categories/validate?name=Shoes&exclude_id={}",
            shoes["id"].as_str().unwrap()
        ))
        .await;
    let own = body_to_json(own).await;
    assert_eq!(own["name_available"], true);
    assert_eq!(own["slug_available"], true);
}

#[tokio::test]
async fn test_validate_rejects_unusable_names_like_create() {
    let app = TestApp::new();

    let checked = app.get("/api/v1/categories/validate?name=%21%21%21").await;
    assert_eq!(checked.status(), StatusCode::BAD_REQUEST);
    let checked = body_to_json(checked).await;

    let created = app
        .send("POST", "/api/v1/categories", Some(json!({"name": "!!!"})))
        .await;
    assert_eq!(created.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(created).await, checked);

    let bad_slug = app
        .get("/api/v1/categories/validate?name=Shoes&slug=Not%20A%20Slug")
        .await;
    assert_eq!(bad_slug.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_payloads() {
    let app = TestApp::new();

    let blank = app
        .send("POST", "/api/v1/categories", Some(json!({"name": "   "})))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let unknown = app.get("/api/v1/brands").await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let empty_bulk = app
        .send("POST", "/api/v1/genders/bulk", Some(json!({"items": []})))
        .await;
    assert_eq!(empty_bulk.status(), StatusCode::BAD_REQUEST);
}

// == Lifecycle Tests ==

#[tokio::test]
async fn test_soft_delete_restore_permanent_delete() {
    let app = TestApp::new();
    let hats = app.create("collections", json!({"name": "Hats"})).await;
    let uri = format!("/api/v1/collections/{}", hats["id"].as_str().unwrap());

    let deleted = app.send("DELETE", &uri, None).await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert!(body_to_json(deleted).await["deleted_at"].is_string());
    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);

    let listed = body_to_json(app.get("/api/v1/collections?include_deleted=true").await).await;
    assert_eq!(listed["total"], 1);

    let restored = app.send("POST", &format!("{}/restore", uri), None).await;
    assert_eq!(restored.status(), StatusCode::OK);
    assert_eq!(app.get(&uri).await.status(), StatusCode::OK);

    let again = app.send("POST", &format!("{}/restore", uri), None).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let gone = app.send("DELETE", &format!("{}/permanent", uri), None).await;
    assert_eq!(gone.status(), StatusCode::OK);
    assert!(body_to_json(gone).await["message"]
        .as_str()
        .unwrap()
        .contains("permanently deleted"));
    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_and_sort_order() {
    let app = TestApp::new();
    let men = app.create("genders", json!({"name": "Men"})).await;
    let women = app.create("genders", json!({"name": "Women"})).await;

    let response = app
        .send(
            "PATCH",
            &format!("/api/v1/genders/{}/status", men["id"].as_str().unwrap()),
            Some(json!({"status": "inactive"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["status"], "inactive");

    let response = app
        .send(
            "PATCH",
            "/api/v1/genders/sort-order",
            Some(json!({"items": [
                {"id": men["id"], "sort_order": 2},
                {"id": women["id"], "sort_order": 1}
            ]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let active = body_to_json(app.get("/api/v1/genders?status=active").await).await;
    assert_eq!(active["total"], 1);
    assert_eq!(active["items"][0]["name"], "Women");

    let stats = body_to_json(app.get("/api/v1/genders/stats").await).await;
    assert_eq!(stats["active"], 1);
    assert_eq!(stats["inactive"], 1);
}

#[tokio::test]
async fn test_bulk_create() {
    let app = TestApp::new();

    let response = app
        .send(
            "POST",
            "/api/v1/collections/bulk",
            Some(json!({"items": [{"name": "Spring"}, {"name": "Autumn", "slug": "fall"}]})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response).await;
    assert_eq!(created[1]["slug"], "fall");

    let by_slug = app.get("/api/v1/collections/slug/fall").await;
    assert_eq!(by_slug.status(), StatusCode::OK);
}

// == Service Endpoint Tests ==

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let app = TestApp::new();
    app.get("/api/v1/genders/stats").await;
    app.get("/api/v1/genders/stats").await;

    let response = app.get("/cache/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-cache").is_none());

    let json = body_to_json(response).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
