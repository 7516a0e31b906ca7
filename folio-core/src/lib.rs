//! Folio Core - Entity Types
//!
//! Pure data structures shared by the storage and API crates. Only shape,
//! validation and error types live here; persistence and HTTP do not.

pub mod entities;
pub mod enums;
pub mod error;

pub use entities::*;
pub use enums::*;
pub use error::*;
