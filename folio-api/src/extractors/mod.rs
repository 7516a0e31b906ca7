//! Request extractors with API-specific rejections.

mod json;
mod path_id;

pub use json::StrictJson;
pub use path_id::{CareerKind, ItemKind, PathId, ProjectKind, SkillKind, TestimonyKind};
