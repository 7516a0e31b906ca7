//! Axum Middleware for Authentication
//!
//! This module provides Axum middleware that:
//! - Requires an `Authorization: Bearer <token>` header
//! - Verifies the token with the configured secret and clock
//! - Injects the verified `Claims` into request extensions
//! - Returns 401 for every authentication failure
//!
//! Admin routes also get no-cache response headers so browsers and proxies
//! never store authenticated content.

use crate::auth::{validate_jwt_token, AuthConfig, Claims};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: Arc<AuthConfig>) -> Self {
        Self { auth_config }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTIONS
// ============================================================================

/// Extract the bearer token. The scheme must be exactly `Bearer `.
fn bearer_token(request: &Request) -> ApiResult<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::from_code(crate::error::ErrorCode::Unauthorized))
}

/// Axum middleware guarding admin routes.
///
/// On success the verified [`Claims`] are available to handlers through
/// [`AuthClaims`]. On failure the wrapped handler never runs.
pub async fn require_auth(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let token = bearer_token(&request).map_err(AuthMiddlewareError)?;
    let claims = validate_jwt_token(&state.auth_config, token).map_err(AuthMiddlewareError)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Marks every response as non-cacheable.
pub async fn no_cache_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for verified token claims.
///
/// `require_auth` must wrap the route. Without it the extractor fails with
/// a 500 rather than silently treating the request as authenticated.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthClaims)
            .ok_or_else(|| {
                tracing::error!("Claims missing from request extensions; is require_auth applied?");
                AuthMiddlewareError(ApiError::internal_error("Internal server error"))
            })
    }
}

impl std::ops::Deref for AuthClaims {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
