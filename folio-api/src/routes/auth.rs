//! Authentication routes: credential login and token introspection.

use std::sync::Arc;

use axum::{extract::State, middleware::from_fn_with_state, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{login, AuthConfig, Claims},
    error::{ApiError, ApiResult},
    extractors::StrictJson,
    middleware::{require_auth, AuthClaims, AuthMiddlewareState},
    state::AppState,
};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/auth/login
///
/// Password verification is memory-hard, so it runs on the blocking pool.
pub async fn login_handler(
    State(config): State<Arc<AuthConfig>>,
    StrictJson(req): StrictJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let token = tokio::task::spawn_blocking(move || login(&config, &req.email, &req.password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Login task failed");
            ApiError::internal_error("Internal server error")
        })??;

    Ok(Json(LoginResponse { token }))
}

/// GET /api/v1/auth/me
pub async fn me(AuthClaims(claims): AuthClaims) -> Json<Claims> {
    Json(claims)
}

pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new().route("/auth/login", post(login_handler)).route(
        "/auth/me",
        get(me).route_layer(from_fn_with_state(
            AuthMiddlewareState::new(state.auth_config.clone()),
            require_auth,
        )),
    )
}
