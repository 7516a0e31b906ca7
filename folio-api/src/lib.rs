//! Folio API - portfolio content backend
//!
//! Axum REST API serving the sections of a personal portfolio site. Public
//! reads go through a cache-aside layer; a single administrator edits
//! content with a bearer token. Data lives in PostgreSQL, cached bodies in
//! Redis.

#[macro_use]
pub mod macros;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{
    generate_jwt_token, hash_password, login, validate_jwt_token, AuthConfig, Claims, JwtClock,
    SystemClock,
};
pub use config::{ApiConfig, CacheBackend, StoreMode};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::{AppState, Repositories};
