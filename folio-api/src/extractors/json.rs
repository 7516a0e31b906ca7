//! JSON body extractor with a uniform rejection.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

/// Like `axum::Json`, but every rejection (syntax, unknown field, wrong
/// media type) becomes `400 {"error": "invalid JSON input"}`. A body cut off
/// by the stream limit stays a 413.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(StrictJson(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                tracing::debug!(error = %rejection.body_text(), "JSON body over the size limit");
                Err(ApiError::payload_too_large())
            }
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected JSON body");
                Err(ApiError::invalid_json())
            }
        }
    }
}
