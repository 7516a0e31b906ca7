//! HTTP hardening middleware.
//!
//! - `security_headers`: browser hardening headers on every response
//! - `request_size_limit`: rejects declared bodies over the cap with 413
//! - `sanitize_query`: rejects query strings carrying NUL bytes
//! - `validate_content_type`: gates body-carrying methods on their media type

use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Default request body cap: 10 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; \
style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; font-src 'self' https:; connect-src 'self';";

const ALLOWED_CONTENT_TYPES: [&str; 3] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
];

/// Add security headers and strip the `Server` header.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let behind_tls = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
    );
    if behind_tls {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
    headers.remove(header::SERVER);

    response
}

/// Reject requests whose declared `Content-Length` exceeds the cap.
///
/// Streamed bodies without a length are capped separately by the body
/// limit layers on the router.
pub async fn request_size_limit(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if let Some(length) = declared {
        if length > limit as u64 {
            tracing::warn!(length, limit, "Request body too large");
            return ApiError::payload_too_large().into_response();
        }
    }

    next.run(request).await
}

fn contains_nul(query: &str) -> bool {
    query.contains('\0') || query.to_ascii_lowercase().contains("%00")
}

/// Reject query strings that carry raw or percent-encoded NUL bytes.
pub async fn sanitize_query(request: Request, next: Next) -> Response {
    if let Some(query) = request.uri().query() {
        if contains_nul(query) {
            return ApiError::invalid_input("Invalid characters in query").into_response();
        }
    }
    next.run(request).await
}

/// Require an accepted `Content-Type` on POST, PUT and PATCH.
pub async fn validate_content_type(request: Request, next: Next) -> Response {
    let method = request.method();
    if method == Method::POST || method == Method::PUT || method == Method::PATCH {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase());

        match content_type {
            None => {
                return ApiError::invalid_input("Content-Type header required").into_response();
            }
            Some(value) => {
                if !ALLOWED_CONTENT_TYPES
                    .iter()
                    .any(|allowed| value.starts_with(allowed))
                {
                    return ApiError::unsupported_media_type().into_response();
                }
            }
        }
    }
    next.run(request).await
}
