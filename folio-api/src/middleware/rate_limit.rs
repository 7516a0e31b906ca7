//! Per-client rate limiting.
//!
//! Each [`ClientRateLimiter`] owns one GCRA token bucket per client key,
//! created lazily on first sight. Buckets hold `N` tokens and refill at
//! `N` per minute. Idle buckets are evicted by the limiter sweep job.

use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    clock::{Clock, DefaultClock},
    Quota, RateLimiter,
};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Type alias for the rate limiter we use.
type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

/// Refill window every quota is expressed in.
pub const REFILL_WINDOW: Duration = Duration::from_secs(60);

struct ClientBucket {
    limiter: DirectRateLimiter,
    last_seen: Instant,
}

/// Token-bucket limiter keyed by client.
pub struct ClientRateLimiter {
    name: &'static str,
    requests_per_minute: u32,
    quota: Quota,
    buckets: DashMap<String, ClientBucket>,
}

impl std::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("name", &self.name)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("tracked_clients", &self.buckets.len())
            .finish()
    }
}

impl ClientRateLimiter {
    /// Create a limiter allowing `requests_per_minute` per client, with an
    /// equal burst. Zero is clamped to one.
    pub fn new(name: &'static str, requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            name,
            requests_per_minute: per_minute.get(),
            quota: Quota::per_minute(per_minute),
            buckets: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Consume one token for `key`.
    ///
    /// Returns the whole seconds to wait (at least 1) when the bucket is empty.
    pub fn allow(&self, key: &str) -> Result<(), u64> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| ClientBucket {
                limiter: RateLimiter::direct(self.quota),
                last_seen: Instant::now(),
            });
        bucket.last_seen = Instant::now();

        bucket.limiter.check().map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }

    /// Drop buckets not touched within `max_idle`. Returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.last_seen.elapsed() < max_idle);
        before.saturating_sub(self.buckets.len())
    }

    /// Number of client keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

// ============================================================================
// CLIENT KEY
// ============================================================================

/// Derive the client key used for throttling.
///
/// Order: first `X-Forwarded-For` entry, `X-Real-IP`, socket peer IP,
/// then the literal `"unknown"`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

// ============================================================================
// MIDDLEWARE
// ============================================================================

/// State for one rate limiting layer.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: Arc<ClientRateLimiter>,
    pub enabled: bool,
}

impl RateLimitState {
    pub fn new(limiter: Arc<ClientRateLimiter>, enabled: bool) -> Self {
        Self { limiter, enabled }
    }
}

/// Error type for rate limit middleware.
#[derive(Debug)]
pub struct RateLimitError {
    /// Seconds until a token is available
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = ApiError::too_many_requests().into_response();
        response.headers_mut().insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from_str(&self.retry_after.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("60")),
        );
        response
    }
}

/// Rate limiting middleware. When limited, returns 429 with `Retry-After`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !state.enabled {
        return Ok(next.run(request).await);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    if let Err(retry_after) = state.limiter.allow(&key) {
        tracing::warn!(
            limiter = state.limiter.name(),
            client = %key,
            retry_after,
            "Rate limit exceeded"
        );
        return Err(RateLimitError { retry_after });
    }

    Ok(next.run(request).await)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use proptest::prelude::*;
    use tower::ServiceExt;

    fn app(limiter: Arc<ClientRateLimiter>) -> Router {
        Router::new()
            .route("/limited", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RateLimitState::new(limiter, true),
                rate_limit_middleware,
            ))
    }

    fn request_from(ip: &str) -> Result<axum::http::Request<Body>, String> {
        axum::http::Request::builder()
            .uri("/limited")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_exactly_n_requests_allowed() {
        let limiter = ClientRateLimiter::new("test", 5);
        for i in 0..5 {
            assert!(limiter.allow("1.2.3.4").is_ok(), "request {} should pass", i + 1);
        }
        let retry_after = limiter.allow("1.2.3.4").expect_err("sixth must be rejected");
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_clients_have_independent_buckets() {
        let limiter = ClientRateLimiter::new("test", 1);
        assert!(limiter.allow("a").is_ok());
        assert!(limiter.allow("a").is_err());
        assert!(limiter.allow("b").is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_zero_budget_is_clamped() {
        let limiter = ClientRateLimiter::new("test", 0);
        assert_eq!(limiter.requests_per_minute(), 1);
        assert!(limiter.allow("a").is_ok());
    }

    #[test]
    fn test_evict_idle_removes_stale_buckets() {
        let limiter = ClientRateLimiter::new("test", 10);
        limiter.allow("a").ok();
        limiter.allow("b").ok();

        assert_eq!(limiter.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(limiter.evict_idle(Duration::ZERO), 2);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_client_key_precedence() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().expect("addr");

        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, None), "unknown");
        assert_eq!(client_key(&headers, Some(peer)), "10.0.0.9");

        headers.insert("x-real-ip", HeaderValue::from_static(" 192.168.1.1 "));
        assert_eq!(client_key(&headers, Some(peer)), "192.168.1.1");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 70.41.3.18"),
        );
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_middleware_rejects_with_retry_after() -> Result<(), String> {
        let limiter = Arc::new(ClientRateLimiter::new("test", 2));

        for _ in 0..2 {
            let response = app(limiter.clone())
                .oneshot(request_from("198.51.100.1")?)
                .await
                .map_err(|e| format!("Request failed: {:?}", e))?;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app(limiter.clone())
            .oneshot(request_from("198.51.100.1")?)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or("missing retry-after")?;
        assert!(retry_after >= 1);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
        assert_eq!(body, serde_json::json!({"error": "Rate limit exceeded"}));

        let other = app(limiter)
            .oneshot(request_from("198.51.100.2")?)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(other.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_layer_passes_everything() -> Result<(), String> {
        let limiter = Arc::new(ClientRateLimiter::new("test", 1));
        let app = Router::new()
            .route("/limited", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RateLimitState::new(limiter, false),
                rate_limit_middleware,
            ));

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(request_from("198.51.100.3")?)
                .await
                .map_err(|e| format!("Request failed: {:?}", e))?;
            assert_eq!(response.status(), StatusCode::OK);
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_n_plus_one_rejects_only_last(n in 1u32..40) {
            let limiter = ClientRateLimiter::new("prop", n);
            let results: Vec<bool> = (0..=n).map(|_| limiter.allow("client").is_ok()).collect();
            let rejected: Vec<usize> = results
                .iter()
                .enumerate()
                .filter(|(_, ok)| !**ok)
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(rejected, vec![n as usize]);
        }

        #[test]
        fn prop_forwarded_for_first_entry_wins(
            first in "[0-9]{1,3}(\\.[0-9]{1,3}){3}",
            rest in "[0-9]{1,3}(\\.[0-9]{1,3}){3}",
        ) {
            let mut headers = HeaderMap::new();
            let value = format!("{}, {}", first, rest);
            headers.insert("x-forwarded-for", HeaderValue::from_str(&value).expect("header"));
            headers.insert("x-real-ip", HeaderValue::from_static("127.0.0.1"));
            prop_assert_eq!(client_key(&headers, None), first);
        }
    }
}
