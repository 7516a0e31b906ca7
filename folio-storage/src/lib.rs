//! Folio Storage - cache backends
//!
//! The API layer talks to the response cache only through [`CacheStore`].
//! Production uses Redis; tests and local development use the in-memory store.

pub mod cache;

pub use cache::{
    CacheError, CacheResult, CacheStats, CacheStore, InMemoryCacheStore, RedisCacheStore,
    RedisConfig,
};
