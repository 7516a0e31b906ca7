//! Cache behavior observed through the router.


use std::time::Duration;

use axum::http::StatusCode;
use folio_storage::CacheStore;
use proptest::prelude::*;
use serde_json::json;
use test_support::*;

const PUBLIC_READS: [(&str, &str); 7] = [
    ("/api/v1/hero", "hero_page_cache"),
    ("/api/v1/about", "about_page_cache"),
    ("/api/v1/about/skills", "technical_skills_cache"),
    ("/api/v1/about/careers", "careers_cache"),
    ("/api/v1/testimony/items/approved", "approved_testimonies_cache"),
    ("/api/v1/project", "project_page_cache"),
    ("/api/v1/project/items", "projects_cache"),
];

fn runtime() -> Result<tokio::runtime::Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(e.to_string()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A cached body is served verbatim without touching the store.
    #[test]
    fn prop_cache_hit_bypasses_store(payload in "[a-zA-Z0-9 ]{0,40}") {
        let rt = runtime()?;
        rt.block_on(async {
            let app = test_app();
            let cached = json!({"name": payload}).to_string();
            app.cache
                .set("hero_page_cache", &cached, Duration::from_secs(600))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let response = send(&app.router, get("/api/v1/hero").map_err(TestCaseError::fail)?)
                .await
                .map_err(TestCaseError::fail)?;
            prop_assert_eq!(response.status(), StatusCode::OK);
            prop_assert_eq!(
                response.headers()["content-type"].to_str().unwrap_or_default(),
                "application/json"
            );
            let body = body_json(response).await.map_err(TestCaseError::fail)?;
            prop_assert_eq!(body, json!({"name": payload}));
            prop_assert_eq!(app.hero.reads(), 0);
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn not_found_responses_are_not_cached() -> Result<(), String> {
    let app = test_app();

    let response = send(&app.router, get("/api/v1/about")?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!app.cache.contains("about_page_cache"));

    let response = send(&app.router, get("/api/v1/project")?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!app.cache.contains("project_page_cache"));
    Ok(())
}

#[tokio::test]
async fn each_public_read_populates_its_own_key() -> Result<(), String> {
    let app = test_app();
    let token = admin_token();

    // Give the singleton pages a row so every read succeeds.
    for (uri, body) in [
        (
            "/api/v1/admin/about",
            json!({"description": "d", "cards": [], "github_link": "", "linkedin_link": "", "available": false}),
        ),
        ("/api/v1/admin/project", json!({"title": "t", "description": "d"})),
    ] {
        let response = send(&app.router, json_request("PATCH", uri, Some(&token), &body)?).await?;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    for (uri, key) in PUBLIC_READS {
        assert!(!app.cache.contains(key), "{} cached early", key);
        let response = send(&app.router, get(uri)?).await?;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert!(app.cache.contains(key), "{} not cached", key);
    }
    Ok(())
}

#[tokio::test]
async fn writes_invalidate_only_their_family() -> Result<(), String> {
    let app = test_app();
    let token = admin_token();

    for uri in ["/api/v1/hero", "/api/v1/about/skills", "/api/v1/project/items"] {
        send(&app.router, get(uri)?).await?;
    }
    assert!(app.cache.contains("hero_page_cache"));
    assert!(app.cache.contains("technical_skills_cache"));
    assert!(app.cache.contains("projects_cache"));

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/v1/admin/project/items",
            Some(&token),
            &json!({
                "name": "Folio",
                "description": "Portfolio backend",
                "type": "Web",
                "contribution": "Personal"
            }),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(!app.cache.contains("projects_cache"));
    assert!(app.cache.contains("hero_page_cache"));
    assert!(app.cache.contains("technical_skills_cache"));

    let listed = body_json(send(&app.router, get("/api/v1/project/items")?).await?).await?;
    assert_eq!(listed["length"], 1);
    assert_eq!(listed["data"][0]["name"], "Folio");
    Ok(())
}

#[tokio::test]
async fn testimony_writes_invalidate_the_approved_listing() -> Result<(), String> {
    let app = test_app();
    let token = admin_token();

    send(&app.router, get("/api/v1/testimony/items/approved")?).await?;
    assert!(app.cache.contains("approved_testimonies_cache"));

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/v1/admin/testimony/items",
            Some(&token),
            &json!({"name": "A", "rating": 4, "description": "Good"}),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(!app.cache.contains("approved_testimonies_cache"));
    Ok(())
}
