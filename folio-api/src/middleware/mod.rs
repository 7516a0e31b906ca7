//! HTTP middleware: authentication, rate limiting, cache-aside and hardening.

pub mod auth;
pub mod cache;
pub mod rate_limit;
pub mod security;

pub use auth::{no_cache_headers, require_auth, AuthClaims, AuthMiddlewareError, AuthMiddlewareState};
pub use cache::{cached_read, invalidate_on_write, keys as cache_keys, CacheBinding, DEFAULT_CACHE_TTL};
pub use rate_limit::{
    client_key, rate_limit_middleware, ClientRateLimiter, RateLimitError, RateLimitState,
    REFILL_WINDOW,
};
pub use security::{
    request_size_limit, sanitize_query, security_headers, validate_content_type,
    DEFAULT_BODY_LIMIT,
};
