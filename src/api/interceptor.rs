//! HTTP Cache Interceptor
//!
//! The HTTP layer keeps no cache of its own. Read handlers attach how the
//! read-through cache answered; this middleware turns that into headers.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::cache::{CacheStatus, Lookup};

pub const X_CACHE: &str = "x-cache";

/// How a read was answered, carried as a response extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOutcome {
    pub status: CacheStatus,
    pub ttl_secs: u64,
}

// == Cached Json ==
/// JSON body of a cached read, tagged with its cache outcome.
#[derive(Debug)]
pub struct CachedJson<T>(pub Lookup<T>);

impl<T: Serialize> IntoResponse for CachedJson<T> {
    fn into_response(self) -> Response {
        let outcome = CacheOutcome {
            status: self.0.status,
            ttl_secs: self.0.ttl_secs,
        };
        let mut response = Json(self.0.value).into_response();
        response.extensions_mut().insert(outcome);
        response
    }
}

// == Middleware ==
/// Sets `x-cache` and `cache-control: public, max-age=N` on cached reads
/// and `cache-control: no-store` on every non-GET response.
pub async fn cache_headers(request: Request, next: Next) -> Response {
    let is_read = request.method() == Method::GET;
    let mut response = next.run(request).await;

    if !is_read {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        return response;
    }

    let Some(outcome) = response.extensions().get::<CacheOutcome>().copied() else {
        return response;
    };
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(outcome.status.as_str()));
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", outcome.ttl_secs)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlClass;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    fn lookup(status: CacheStatus) -> CachedJson<&'static str> {
        CachedJson(Lookup {
            value: "shoes",
            status,
            class: TtlClass::Detail,
            ttl_secs: 600,
        })
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/hit",
                get(|| async { lookup(CacheStatus::Hit) })
                    .post(|| async { lookup(CacheStatus::Miss) }),
            )
            .route("/miss", get(|| async { lookup(CacheStatus::Miss) }))
            .route("/plain", get(|| async { "ok" }))
            .layer(middleware::from_fn(cache_headers))
    }

    async fn send(method: &str, uri: &str) -> Response {
        app()
            .oneshot(
                axum::http::Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_hit_headers() {
        let response = send("GET", "/hit").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "HIT");
        assert_eq!(response.headers()["cache-control"], "public, max-age=600");
    }

    #[tokio::test]
    async fn test_miss_headers() {
        let response = send("GET", "/miss").await;
        assert_eq!(response.headers()["x-cache"], "MISS");
    }

    #[tokio::test]
    async fn test_uncached_read_left_alone() {
        let response = send("GET", "/plain").await;
        assert!(response.headers().get("x-cache").is_none());
        assert!(response.headers().get("cache-control").is_none());
    }

    #[tokio::test]
    async fn test_writes_are_no_store() {
        let response = send("POST", "/hit").await;
        assert!(response.headers().get("x-cache").is_none());
        assert_eq!(response.headers()["cache-control"], "no-store");
    }
}
