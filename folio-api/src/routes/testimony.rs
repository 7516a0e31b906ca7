//! Testimony section routes.
//!
//! The page has its own cache key. Every item write, approval included,
//! invalidates `approved_testimonies_cache` since approval decides public
//! visibility.

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch},
    Json, Router,
};
use folio_core::{Listing, NewTestimony, Testimony, TestimonyApproval, TestimonyPage, TestimonyPatch};

use super::generic::{page_read_route, page_routes, MessageResponse};
use crate::{
    error::ApiResult,
    extractors::{ItemKind, PathId, StrictJson, TestimonyKind},
    middleware::{cache_keys, cached_read, invalidate_on_write},
    services::TestimonyService,
    state::AppState,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/testimony/items/approved
pub async fn list_approved(
    State(service): State<TestimonyService>,
) -> ApiResult<Json<Listing<Testimony>>> {
    Ok(Json(Listing::from(service.list_approved().await?)))
}

/// GET /api/v1/admin/testimony/items
pub async fn list_all(
    State(service): State<TestimonyService>,
) -> ApiResult<Json<Listing<Testimony>>> {
    Ok(Json(Listing::from(service.list_all().await?)))
}

/// POST /api/v1/admin/testimony/items
pub async fn create_testimony(
    State(service): State<TestimonyService>,
    StrictJson(req): StrictJson<NewTestimony>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    service.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(TestimonyKind::NAME)),
    ))
}

/// PATCH /api/v1/admin/testimony/items/:id
pub async fn update_testimony(
    State(service): State<TestimonyService>,
    id: PathId<TestimonyKind>,
    StrictJson(patch): StrictJson<TestimonyPatch>,
) -> ApiResult<Json<MessageResponse>> {
    service.update(id.id(), patch).await?;
    Ok(Json(MessageResponse::new("Testimony updated")))
}

/// PATCH /api/v1/admin/testimony/items/:id/approve
pub async fn approve_testimony(
    State(service): State<TestimonyService>,
    id: PathId<TestimonyKind>,
    StrictJson(req): StrictJson<TestimonyApproval>,
) -> ApiResult<Json<MessageResponse>> {
    service.set_approval(id.id(), req.approved).await?;
    Ok(Json(MessageResponse::new("Testimony approval updated")))
}

/// DELETE /api/v1/admin/testimony/items/:id
pub async fn delete_testimony(
    State(service): State<TestimonyService>,
    id: PathId<TestimonyKind>,
) -> ApiResult<StatusCode> {
    service.delete(id.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTERS
// ============================================================================

pub fn public_router(state: &AppState) -> Router<AppState> {
    let page = page_read_route::<TestimonyPage>("/testimony").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::TESTIMONY_PAGE),
        cached_read,
    ));
    let approved = Router::new()
        .route("/testimony/items/approved", get(list_approved))
        .route_layer(from_fn_with_state(
            state.cache_binding(cache_keys::APPROVED_TESTIMONIES),
            cached_read,
        ));

    page.merge(approved)
}

pub fn admin_router(state: &AppState) -> Router<AppState> {
    let page = page_routes::<TestimonyPage>("/testimony").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::TESTIMONY_PAGE),
        invalidate_on_write,
    ));
    let items = Router::new()
        .route("/testimony/items", get(list_all).post(create_testimony))
        .route(
            "/testimony/items/:id",
            patch(update_testimony).delete(delete_testimony),
        )
        .route("/testimony/items/:id/approve", patch(approve_testimony))
        .route_layer(from_fn_with_state(
            state.cache_binding(cache_keys::APPROVED_TESTIMONIES),
            invalidate_on_write,
        ));

    page.merge(items)
}
