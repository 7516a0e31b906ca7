//! Axum Middleware for HTTP Request Tracing
//!
//! Wraps every request in an `http_request` span and logs method, path,
//! status and latency when the response is ready.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

static NUMERIC_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\d+(/|$)").ok());

/// Normalize path for spans (replace numeric ids with a placeholder).
pub(crate) fn normalize_path(path: &str) -> String {
    let Some(pattern) = NUMERIC_SEGMENT.as_ref() else {
        return path.to_string();
    };
    // Adjacent ids share a slash, so one pass can miss every other segment.
    let once = pattern.replace_all(path, "/{id}$1");
    pattern.replace_all(&once, "/{id}$1").to_string()
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let status = response.status();
    let duration = start.elapsed();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Request completed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric_id() {
        assert_eq!(
            normalize_path("/api/v1/admin/project/items/12345"),
            "/api/v1/admin/project/items/{id}"
        );
    }

    #[test]
    fn test_normalize_path_nested_id() {
        assert_eq!(
            normalize_path("/api/v1/admin/testimony/items/7/approve"),
            "/api/v1/admin/testimony/items/{id}/approve"
        );
    }

    #[test]
    fn test_normalize_path_consecutive_ids() {
        assert_eq!(normalize_path("/a/1/2/3"), "/a/{id}/{id}/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/hero"), "/api/v1/hero");
        assert_eq!(normalize_path("/api/v1/v2name"), "/api/v1/v2name");
    }
}
