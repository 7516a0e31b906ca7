//! About section routes: the page, technical skills and career journeys.
//!
//! Each of the three families has its own cache key, so each sub-router
//! carries its own cache layer.

use axum::{middleware::from_fn_with_state, routing::post, Router};
use folio_core::{AboutPage, CareerJourney, TechnicalSkill};

use super::generic::{item_read_route, item_routes, page_read_route, page_routes};
use super::image::upload_profile_image;
use crate::middleware::{cache_keys, cached_read, invalidate_on_write};
use crate::state::AppState;

pub fn public_router(state: &AppState) -> Router<AppState> {
    let page = page_read_route::<AboutPage>("/about").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::ABOUT_PAGE),
        cached_read,
    ));
    let skills = item_read_route::<TechnicalSkill>("/about/skills").route_layer(
        from_fn_with_state(state.cache_binding(cache_keys::TECHNICAL_SKILLS), cached_read),
    );
    let careers = item_read_route::<CareerJourney>("/about/careers").route_layer(
        from_fn_with_state(state.cache_binding(cache_keys::CAREERS), cached_read),
    );

    page.merge(skills).merge(careers)
}

pub fn admin_router(state: &AppState) -> Router<AppState> {
    let page = page_routes::<AboutPage>("/about")
        .route_layer(from_fn_with_state(
            state.cache_binding(cache_keys::ABOUT_PAGE),
            invalidate_on_write,
        ))
        .route("/about/image", post(upload_profile_image));
    let skills = item_routes::<TechnicalSkill>("/about/skills").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::TECHNICAL_SKILLS),
        invalidate_on_write,
    ));
    let careers = item_routes::<CareerJourney>("/about/careers").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::CAREERS),
        invalidate_on_write,
    ));

    page.merge(skills).merge(careers)
}
