//! Limiter behavior observed through the router.


use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use folio_api::ApiConfig;
use serde_json::json;
use test_support::*;

fn login_from(ip: &str) -> Result<Request<Body>, String> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            json!({"email": ADMIN_EMAIL, "password": "wrong"}).to_string(),
        ))
        .map_err(|e| e.to_string())
}

fn get_from(uri: &str, ip: &str) -> Result<Request<Body>, String> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .map_err(|e| e.to_string())
}

#[tokio::test]
async fn sixth_login_in_a_window_is_limited() -> Result<(), String> {
    let app = test_app_with(ApiConfig::default());

    for attempt in 1..=5 {
        let response = send(&app.router, login_from("203.0.113.7")?).await?;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "attempt {} should reach the handler",
            attempt
        );
    }

    let limited = send(&app.router, login_from("203.0.113.7")?).await?;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = limited.headers()[header::RETRY_AFTER]
        .to_str()
        .map_err(|e| e.to_string())?
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    assert!(retry_after >= 1);
    assert_eq!(body_json(limited).await?["error"], "Rate limit exceeded");

    // Another client still has its full budget.
    let other = send(&app.router, login_from("198.51.100.1")?).await?;
    assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn auth_limit_does_not_drain_public_reads() -> Result<(), String> {
    let app = test_app_with(ApiConfig::default());

    for _ in 0..6 {
        send(&app.router, login_from("203.0.113.9")?).await?;
    }
    let response = send(&app.router, get_from("/api/v1/hero", "203.0.113.9")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn public_reads_are_limited_per_client() -> Result<(), String> {
    let app = test_app_with(ApiConfig {
        rate_limit_public: 3,
        ..ApiConfig::default()
    });

    for _ in 0..3 {
        let response = send(&app.router, get_from("/api/v1/hero", "192.0.2.4")?).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let limited = send(&app.router, get_from("/api/v1/hero", "192.0.2.4")?).await?;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));

    // Health only pays the global limiter.
    let health = send(&app.router, get_from("/api/v1/health", "192.0.2.4")?).await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn disabled_limiting_never_rejects() -> Result<(), String> {
    let app = test_app();
    for _ in 0..7 {
        let response = send(&app.router, login_from("203.0.113.7")?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    Ok(())
}
