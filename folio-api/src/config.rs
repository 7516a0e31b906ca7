//! API Configuration Module
//!
//! Listener, CORS, rate limiting, request hardening and backend selection.
//! Every field is loaded from the environment with a development default.

use crate::middleware::{DEFAULT_BODY_LIMIT, DEFAULT_CACHE_TTL};
use axum::http::{header, header::HeaderName, HeaderValue, Method};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Origin allowed when `ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Which cache store backs the cache-aside layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl CacheBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => CacheBackend::Memory,
            _ => CacheBackend::Redis,
        }
    }
}

/// Which repositories hold the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Postgres,
    Memory,
}

impl StoreMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => StoreMode::Memory,
            _ => StoreMode::Postgres,
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_host: String,
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    pub cors_origins: Vec<String>,
    pub cors_max_age_secs: u64,

    pub rate_limit_enabled: bool,
    /// Requests per minute per client across the whole API.
    pub rate_limit_global: u32,
    /// Requests per minute per client on cached public reads.
    pub rate_limit_public: u32,
    /// Requests per minute per client on the auth group.
    pub rate_limit_auth: u32,

    pub request_body_limit: usize,
    pub request_timeout: Duration,

    pub cache_backend: CacheBackend,
    pub cache_ttl: Duration,
    pub store_mode: StoreMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5555,
            cors_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            cors_max_age_secs: 300,
            rate_limit_enabled: true,
            rate_limit_global: 60,
            rate_limit_public: 30,
            rate_limit_auth: 5,
            request_body_limit: DEFAULT_BODY_LIMIT,
            request_timeout: Duration::from_secs(30),
            cache_backend: CacheBackend::Redis,
            cache_ttl: DEFAULT_CACHE_TTL,
            store_mode: StoreMode::Postgres,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`, `FOLIO_BIND`: listener (default: 0.0.0.0:5555)
    /// - `ALLOWED_ORIGINS`: comma-separated CORS origins
    /// - `FOLIO_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `FOLIO_RATE_LIMIT_GLOBAL` / `_PUBLIC` / `_AUTH`: budgets per minute
    /// - `FOLIO_REQUEST_BODY_LIMIT`: body cap in bytes
    /// - `FOLIO_REQUEST_TIMEOUT_SECS`: pipeline budget
    /// - `FOLIO_CACHE_BACKEND`: "redis" or "memory"
    /// - `FOLIO_CACHE_TTL_SECS`: cache entry lifetime
    /// - `FOLIO_STORE`: "postgres" or "memory"
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_origins);

        let rate_limit_enabled = std::env::var("FOLIO_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| s.trim().to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            bind_host: std::env::var("FOLIO_BIND").unwrap_or(defaults.bind_host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            cors_origins,
            cors_max_age_secs: defaults.cors_max_age_secs,
            rate_limit_enabled,
            rate_limit_global: env_parse("FOLIO_RATE_LIMIT_GLOBAL")
                .unwrap_or(defaults.rate_limit_global),
            rate_limit_public: env_parse("FOLIO_RATE_LIMIT_PUBLIC")
                .unwrap_or(defaults.rate_limit_public),
            rate_limit_auth: env_parse("FOLIO_RATE_LIMIT_AUTH").unwrap_or(defaults.rate_limit_auth),
            request_body_limit: env_parse("FOLIO_REQUEST_BODY_LIMIT")
                .unwrap_or(defaults.request_body_limit),
            request_timeout: env_parse("FOLIO_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            cache_backend: std::env::var("FOLIO_CACHE_BACKEND")
                .map(|v| CacheBackend::parse(&v))
                .unwrap_or(defaults.cache_backend),
            cache_ttl: env_parse("FOLIO_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            store_mode: std::env::var("FOLIO_STORE")
                .map(|v| StoreMode::parse(&v))
                .unwrap_or(defaults.store_mode),
        }
    }

    /// Resolve the listen address, falling back to all interfaces.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.bind_host, self.port)
            .parse()
            .unwrap_or_else(|_| {
                tracing::warn!(host = %self.bind_host, "Invalid FOLIO_BIND, using 0.0.0.0");
                SocketAddr::from(([0, 0, 0, 0], self.port))
            })
    }

    /// Build the CORS layer for the configured origins.
    ///
    /// Unparseable origins are skipped with a warning.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        tracing::info!(origins = ?self.cors_origins, "CORS: allowing origins");

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::ACCEPT,
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static("x-csrf-token"),
                HeaderName::from_static("x-requested-with"),
            ])
            .expose_headers([header::LINK])
            .allow_credentials(true)
            .max_age(Duration::from_secs(self.cors_max_age_secs))
    }
}
