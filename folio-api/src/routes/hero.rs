//! Hero section routes.

use axum::{middleware::from_fn_with_state, routing::post, Router};
use folio_core::HeroPage;

use super::generic::{page_read_route, page_routes};
use super::image::upload_hero_image;
use crate::middleware::{cache_keys, cached_read, invalidate_on_write};
use crate::state::AppState;

/// GET /hero, cached under `hero_page_cache`.
pub fn public_router(state: &AppState) -> Router<AppState> {
    page_read_route::<HeroPage>("/hero").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::HERO_PAGE),
        cached_read,
    ))
}

/// GET/PATCH /hero and POST /hero/image, nested under `/admin`.
pub fn admin_router(state: &AppState) -> Router<AppState> {
    page_routes::<HeroPage>("/hero")
        .route_layer(from_fn_with_state(
            state.cache_binding(cache_keys::HERO_PAGE),
            invalidate_on_write,
        ))
        .route("/hero/image", post(upload_hero_image))
}
