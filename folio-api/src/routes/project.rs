//! Project section routes.

use axum::{middleware::from_fn_with_state, routing::post, Router};
use folio_core::{Project, ProjectPage};

use super::generic::{item_read_route, item_routes, page_read_route, page_routes};
use super::image::upload_project_image;
use crate::middleware::{cache_keys, cached_read, invalidate_on_write};
use crate::state::AppState;

pub fn public_router(state: &AppState) -> Router<AppState> {
    let page = page_read_route::<ProjectPage>("/project").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::PROJECT_PAGE),
        cached_read,
    ));
    let items = item_read_route::<Project>("/project/items").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::PROJECTS),
        cached_read,
    ));

    page.merge(items)
}

pub fn admin_router(state: &AppState) -> Router<AppState> {
    let page = page_routes::<ProjectPage>("/project").route_layer(from_fn_with_state(
        state.cache_binding(cache_keys::PROJECT_PAGE),
        invalidate_on_write,
    ));
    // The upload route sits beside `/project/items/:id`; static segments win.
    let items = item_routes::<Project>("/project/items")
        .route_layer(from_fn_with_state(
            state.cache_binding(cache_keys::PROJECTS),
            invalidate_on_write,
        ))
        .route("/project/items/image", post(upload_project_image));

    page.merge(items)
}
