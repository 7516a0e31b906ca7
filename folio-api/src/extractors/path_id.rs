//! Custom path extractor for numeric item IDs.
//!
//! `PathId<K>` parses the `:id` segment and rejects anything that is not an
//! integer with `400 {"error": "Invalid <kind> ID"}`.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use folio_core::ItemId;
use std::marker::PhantomData;

/// Names the item collection an id belongs to.
pub trait ItemKind: Send + Sync + 'static {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct SkillKind;
impl ItemKind for SkillKind {
    const NAME: &'static str = "skill";
}

#[derive(Debug, Clone, Copy)]
pub struct CareerKind;
impl ItemKind for CareerKind {
    const NAME: &'static str = "career";
}

#[derive(Debug, Clone, Copy)]
pub struct TestimonyKind;
impl ItemKind for TestimonyKind {
    const NAME: &'static str = "testimony";
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectKind;
impl ItemKind for ProjectKind {
    const NAME: &'static str = "project";
}

/// Extractor for a numeric item id from the path.
///
/// # Example
///
/// ```rust,ignore
/// async fn delete_skill(PathId(id, _): PathId<SkillKind>) -> ApiResult<StatusCode> {
///     // id is an ItemId
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId<K: ItemKind>(pub ItemId, pub PhantomData<K>);

impl<K: ItemKind> PathId<K> {
    pub fn id(&self) -> ItemId {
        self.0
    }
}

#[async_trait]
impl<S, K> FromRequestParts<S> for PathId<K>
where
    S: Send + Sync,
    K: ItemKind,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let invalid = || ApiError::invalid_input(format!("Invalid {} ID", K::NAME));

        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid())?;

        raw.trim()
            .parse::<ItemId>()
            .map(|id| PathId(id, PhantomData))
            .map_err(|_| invalid())
    }
}
