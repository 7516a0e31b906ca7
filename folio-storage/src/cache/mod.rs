//! Response cache backends.

mod memory;
mod redis_store;
mod traits;

pub use memory::InMemoryCacheStore;
pub use redis_store::{RedisCacheStore, RedisConfig};
pub use traits::{CacheError, CacheResult, CacheStats, CacheStore};
