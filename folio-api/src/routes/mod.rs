//! REST API Routes Module
//!
//! Route handlers organized by portfolio section, plus the router builder
//! that composes them with the middleware stack.
//!
//! Route groups under `/api/v1`:
//! - `/health` (no limiter beyond the global one)
//! - public reads, charged to the public limiter and served through the cache
//! - `/auth/*`, charged to the auth limiter
//! - `/admin/*`, guarded by bearer tokens; writes invalidate their family key

pub mod about;
pub mod auth;
pub mod generic;
pub mod health;
pub mod hero;
pub mod image;
pub mod project;
pub mod testimony;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    extract::Request,
    http::{header, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

use crate::error::ApiError;
use crate::middleware::{
    no_cache_headers, rate_limit_middleware, request_size_limit, require_auth, sanitize_query,
    security_headers, validate_content_type, AuthMiddlewareState, RateLimitState,
};
use crate::state::AppState;
use crate::telemetry::observability_middleware;

pub use generic::MessageResponse;

// ============================================================================
// FALLBACKS
// ============================================================================

async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Give the router's bare 405 a JSON body. The `Allow` header is kept.
async fn method_not_allowed_json(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = ApiError::method_not_allowed().into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}

async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        ApiError::timeout()
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::internal_error("Internal server error")
    }
}

// ============================================================================
// ROUTE GROUPS
// ============================================================================

fn public_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(hero::public_router(state))
        .merge(about::public_router(state))
        .merge(testimony::public_router(state))
        .merge(project::public_router(state))
        .route_layer(from_fn_with_state(
            RateLimitState::new(
                state.limiters.public.clone(),
                state.api_config.rate_limit_enabled,
            ),
            rate_limit_middleware,
        ))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    auth::create_router(state).route_layer(from_fn_with_state(
        RateLimitState::new(
            state.limiters.auth.clone(),
            state.api_config.rate_limit_enabled,
        ),
        rate_limit_middleware,
    ))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(hero::admin_router(state))
        .merge(about::admin_router(state))
        .merge(testimony::admin_router(state))
        .merge(project::admin_router(state))
        .route_layer(from_fn_with_state(
            AuthMiddlewareState::new(state.auth_config.clone()),
            require_auth,
        ))
        .route_layer(from_fn(no_cache_headers))
}

// ============================================================================
// ROUTER BUILDER
// ============================================================================

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. Security headers
/// 2. Declared and streamed body size limits
/// 3. Query sanitization
/// 4. Global rate limit
/// 5. CORS
/// 6. Observability
/// 7. Timeout
/// 8. Compression
/// 9. Content-Type validation
pub fn create_api_router(state: AppState) -> Router {
    let config = state.api_config.clone();
    let body_limit = config.request_body_limit;

    let api = Router::new()
        .merge(health::create_router())
        .merge(public_routes(&state))
        .merge(auth_routes(&state))
        .nest("/admin", admin_routes(&state));

    Router::new()
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(from_fn(method_not_allowed_json))
        .layer(from_fn(validate_content_type))
        .layer(CompressionLayer::new())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(config.request_timeout),
        )
        .layer(from_fn(observability_middleware))
        .layer(config.cors_layer())
        .layer(from_fn_with_state(
            RateLimitState::new(state.limiters.global.clone(), config.rate_limit_enabled),
            rate_limit_middleware,
        ))
        .layer(from_fn(sanitize_query))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(from_fn_with_state(body_limit, request_size_limit))
        .layer(from_fn(security_headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::config::ApiConfig;
    use crate::state::Repositories;
    use crate::services::ImageService;
    use axum::body::Body;
    use folio_storage::InMemoryCacheStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(
            ApiConfig::default(),
            AuthConfig::new("test-secret-that-is-long-enough-32", "a@b.c", "", "1"),
            Arc::new(InMemoryCacheStore::new()),
            Repositories::in_memory(),
            None,
            ImageService::default(),
        );
        create_api_router(state)
    }

    async fn body_json(response: Response) -> Result<serde_json::Value, String> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())
    }

    #[tokio::test]
    async fn test_health() -> Result<(), String> {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(body_json(response).await?["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() -> Result<(), String> {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nope")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await?["error"], "Route not found");
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() -> Result<(), String> {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/hero")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));
        assert_eq!(body_json(response).await?["error"], "Method not allowed");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_requires_token_and_sets_no_cache() -> Result<(), String> {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/hero")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_page_is_404() -> Result<(), String> {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/about")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await?["error"], "About page not found");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_list_is_not_404() -> Result<(), String> {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/project/items")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await?,
            serde_json::json!({"length": 0, "data": []})
        );
        Ok(())
    }
}
