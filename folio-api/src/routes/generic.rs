//! Generic route handlers for page sections and item collections.
//!
//! Every family is either a singleton page (get + full-document update) or a
//! collection (list, create, partial update, delete). The handlers here are
//! instantiated per entity type by the family routers.
//!
//! ```ignore
//! Router::new()
//!     .merge(page_routes::<HeroPage>("/hero"))
//!     .merge(item_routes::<TechnicalSkill>("/about/skills"))
//! ```

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use folio_core::{CareerJourney, Listing, Project, TechnicalSkill};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::ApiResult,
    extractors::{CareerKind, ItemKind, PathId, ProjectKind, SkillKind, StrictJson},
    repositories::Item,
    services::{ItemService, PageSection, PageService},
    state::AppState,
};

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// `{"message": "..."}` acknowledgement for writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn created(kind: &str) -> Self {
        Self::new(format!("Successfully created a {}", kind))
    }
}

// ============================================================================
// PAGE HANDLERS
// ============================================================================

pub async fn get_page_handler<P>(State(service): State<PageService<P>>) -> ApiResult<Json<P>>
where
    P: PageSection + Serialize,
{
    Ok(Json(service.get().await?))
}

pub async fn update_page_handler<P>(
    State(service): State<PageService<P>>,
    StrictJson(page): StrictJson<P>,
) -> ApiResult<Json<MessageResponse>>
where
    P: PageSection + DeserializeOwned,
{
    service.update(page).await?;
    Ok(Json(MessageResponse::new(format!("{} page updated", P::NAME))))
}

/// Public read of a page section.
pub fn page_read_route<P>(path: &str) -> Router<AppState>
where
    P: PageSection + Serialize,
    PageService<P>: axum::extract::FromRef<AppState>,
{
    Router::new().route(path, get(get_page_handler::<P>))
}

/// Admin read and update of a page section.
pub fn page_routes<P>(path: &str) -> Router<AppState>
where
    P: PageSection + Serialize + DeserializeOwned,
    PageService<P>: axum::extract::FromRef<AppState>,
{
    Router::new().route(
        path,
        get(get_page_handler::<P>).patch(update_page_handler::<P>),
    )
}

// ============================================================================
// ITEM HANDLERS
// ============================================================================

/// An item collection served through [`ItemService`].
pub trait ItemRoute: Item + Serialize {
    /// Path id kind, also used in the create message.
    type Kind: ItemKind;
}

impl ItemRoute for TechnicalSkill {
    type Kind = SkillKind;
}

impl ItemRoute for CareerJourney {
    type Kind = CareerKind;
}

impl ItemRoute for Project {
    type Kind = ProjectKind;
}

pub async fn list_handler<T>(State(service): State<ItemService<T>>) -> ApiResult<Json<Listing<T>>>
where
    T: ItemRoute,
{
    Ok(Json(Listing::from(service.list().await?)))
}

pub async fn create_handler<T>(
    State(service): State<ItemService<T>>,
    StrictJson(draft): StrictJson<T::Draft>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)>
where
    T: ItemRoute,
    T::Draft: DeserializeOwned,
{
    service.create(draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(<T::Kind as ItemKind>::NAME)),
    ))
}

pub async fn update_handler<T>(
    State(service): State<ItemService<T>>,
    id: PathId<T::Kind>,
    StrictJson(patch): StrictJson<T::Patch>,
) -> ApiResult<Json<MessageResponse>>
where
    T: ItemRoute,
    T::Patch: DeserializeOwned,
{
    service.update(id.id(), patch).await?;
    Ok(Json(MessageResponse::new(format!("{} updated", T::ENTITY))))
}

pub async fn delete_handler<T>(
    State(service): State<ItemService<T>>,
    id: PathId<T::Kind>,
) -> ApiResult<StatusCode>
where
    T: ItemRoute,
{
    service.delete(id.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public listing of a collection.
pub fn item_read_route<T>(path: &str) -> Router<AppState>
where
    T: ItemRoute,
    ItemService<T>: axum::extract::FromRef<AppState>,
{
    Router::new().route(path, get(list_handler::<T>))
}

/// Admin CRUD for a collection: `path` and `path/:id`.
pub fn item_routes<T>(path: &str) -> Router<AppState>
where
    T: ItemRoute,
    T::Draft: DeserializeOwned,
    T::Patch: DeserializeOwned,
    ItemService<T>: axum::extract::FromRef<AppState>,
{
    Router::new()
        .route(path, get(list_handler::<T>).post(create_handler::<T>))
        .route(
            &format!("{}/:id", path),
            patch(update_handler::<T>).delete(delete_handler::<T>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_messages() {
        assert_eq!(
            MessageResponse::created(SkillKind::NAME).message,
            "Successfully created a skill"
        );
        assert_eq!(
            MessageResponse::created(<<CareerJourney as ItemRoute>::Kind as ItemKind>::NAME).message,
            "Successfully created a career"
        );
        assert_eq!(
            MessageResponse::created(<<Project as ItemRoute>::Kind as ItemKind>::NAME).message,
            "Successfully created a project"
        );
    }

    #[test]
    fn test_message_serializes_as_object() {
        let json = serde_json::to_value(MessageResponse::new("Skill updated")).expect("json");
        assert_eq!(json, serde_json::json!({"message": "Skill updated"}));
    }
}
