//! Cache-aside middleware.
//!
//! `cached_read` serves a family's JSON from the cache store and populates it
//! on successful misses. `invalidate_on_write` deletes the family key after
//! any 2xx write, before the response leaves the server. Safe methods pass
//! through it untouched so a family router can carry the layer as a whole.

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use folio_storage::CacheStore;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a cached family body.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Upper bound on a response body buffered for caching. Larger or
/// unsized bodies pass through uncached.
const MAX_CACHEABLE_BODY: usize = 8 * 1024 * 1024;

/// Fixed cache keys, one per resource family.
pub mod keys {
    pub const HERO_PAGE: &str = "hero_page_cache";
    pub const ABOUT_PAGE: &str = "about_page_cache";
    pub const TECHNICAL_SKILLS: &str = "technical_skills_cache";
    pub const CAREERS: &str = "careers_cache";
    pub const TESTIMONY_PAGE: &str = "testimony_page_cache";
    pub const APPROVED_TESTIMONIES: &str = "approved_testimonies_cache";
    pub const PROJECT_PAGE: &str = "project_page_cache";
    pub const PROJECTS: &str = "projects_cache";
}

/// Binds a cache store to one family key.
#[derive(Clone)]
pub struct CacheBinding {
    pub store: Arc<dyn CacheStore>,
    pub key: &'static str,
    pub ttl: Duration,
}

impl CacheBinding {
    pub fn new(store: Arc<dyn CacheStore>, key: &'static str, ttl: Duration) -> Self {
        Self { store, key, ttl }
    }
}

fn json_response(body: String) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Get-or-populate read decorator.
pub async fn cached_read(
    State(binding): State<CacheBinding>,
    request: Request,
    next: Next,
) -> Response {
    match binding.store.get(binding.key).await {
        Ok(Some(body)) => {
            tracing::debug!(key = binding.key, "Cache hit");
            return json_response(body);
        }
        Ok(None) => tracing::debug!(key = binding.key, "Cache miss"),
        Err(e) => tracing::warn!(key = binding.key, error = %e, "Cache read failed, treating as miss"),
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let fits = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= MAX_CACHEABLE_BODY as u64);
    if !fits {
        tracing::debug!(key = binding.key, "Response too large to cache, passing through");
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_CACHEABLE_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(key = binding.key, error = %e, "Failed to buffer response body");
            return crate::error::ApiError::internal_error("Internal server error").into_response();
        }
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => {
            if let Err(e) = binding.store.set(binding.key, text, binding.ttl).await {
                tracing::warn!(key = binding.key, error = %e, "Cache populate failed");
            }
        }
        Err(_) => tracing::debug!(key = binding.key, "Skipping cache for non UTF-8 body"),
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// Post-success invalidation decorator for writes.
pub async fn invalidate_on_write(
    State(binding): State<CacheBinding>,
    request: Request,
    next: Next,
) -> Response {
    let is_write = !matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    );
    let response = next.run(request).await;
    if is_write && response.status().is_success() {
        match binding.store.delete(binding.key).await {
            Ok(removed) => tracing::debug!(key = binding.key, removed, "Cache invalidated"),
            Err(e) => tracing::warn!(key = binding.key, error = %e, "Cache invalidation failed"),
        }
    }
    response
}
