//! Image upload handlers.
//!
//! Each handler reads the multipart field `file` and forwards it to the
//! image service with its section's folder and transformation.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use crate::{
    error::{ApiError, ApiResult},
    services::{ImageService, ImageUpload, UploadResult},
};

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

fn missing_file() -> ApiError {
    ApiError::invalid_input("Failed to get file")
}

/// Pull the `file` field out of a multipart body.
async fn read_file(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<ImageUpload> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e.body_text(), "Rejected multipart body");
        missing_file()
    })?;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read multipart field");
            missing_file()
        })?;
        let Some(field) = field else {
            return Err(missing_file());
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read file field");
            missing_file()
        })?;

        return Ok(ImageUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
}

/// POST /api/v1/admin/hero/image
pub async fn upload_hero_image(
    State(images): State<ImageService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResult>> {
    let upload = read_file(multipart).await?;
    Ok(Json(images.upload_hero(upload).await?))
}

/// POST /api/v1/admin/about/image
pub async fn upload_profile_image(
    State(images): State<ImageService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResult>> {
    let upload = read_file(multipart).await?;
    Ok(Json(images.upload_profile(upload).await?))
}

/// POST /api/v1/admin/project/items/image
pub async fn upload_project_image(
    State(images): State<ImageService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResult>> {
    let upload = read_file(multipart).await?;
    Ok(Json(images.upload_project(upload).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, http::StatusCode, routing::post, Router};
    use folio_core::ImageError;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use crate::services::{ImageProvider, UploadOptions};

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<(String, UploadOptions)>>,
    }

    #[async_trait]
    impl ImageProvider for RecordingProvider {
        async fn upload(
            &self,
            upload: ImageUpload,
            options: UploadOptions,
        ) -> Result<UploadResult, ImageError> {
            self.seen
                .lock()
                .expect("lock")
                .push((upload.filename.clone(), options.clone()));
            Ok(UploadResult {
                url: format!("https://img.example/{}", upload.filename),
                public_id: "1_photo".to_string(),
                format: options.format,
                width: 10,
                height: 10,
                bytes: upload.bytes.len() as u64,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            })
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    fn app(images: ImageService) -> Router {
        Router::new()
            .route("/profile", post(upload_profile_image))
            .route("/hero", post(upload_hero_image))
            .with_state(images)
    }

    fn multipart_request(uri: &str, field: &str, filename: &str) -> Result<Request<Body>, String> {
        let boundary = "folio-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary,
            field = field,
            filename = filename,
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .map_err(|e| e.to_string())
    }

    async fn body_json(response: axum::response::Response) -> Result<serde_json::Value, String> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())
    }

    #[tokio::test]
    async fn test_profile_upload_uses_profile_options() -> Result<(), String> {
        let provider = Arc::new(RecordingProvider::default());
        let images = ImageService::new(Some(provider.clone()));

        let response = app(images)
            .oneshot(multipart_request("/profile", FILE_FIELD, "me.png")?)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await?;
        assert_eq!(json["url"], "https://img.example/me.png");
        assert_eq!(json["bytes"], 7);

        let seen = provider.seen.lock().map_err(|e| e.to_string())?;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1.folder, "portfolio/profile");
        assert_eq!(seen[0].1.transformation.as_deref(), Some("w_500,h_500,c_fill"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_field_is_rejected() -> Result<(), String> {
        let images = ImageService::new(Some(Arc::new(RecordingProvider::default())));
        let response = app(images)
            .oneshot(multipart_request("/hero", "attachment", "me.png")?)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await?["error"], "Failed to get file");
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_extension_is_rejected() -> Result<(), String> {
        let images = ImageService::new(Some(Arc::new(RecordingProvider::default())));
        let response = app(images)
            .oneshot(multipart_request("/hero", FILE_FIELD, "notes.txt")?)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_unconfigured_host_is_unavailable() -> Result<(), String> {
        let response = app(ImageService::default())
            .oneshot(multipart_request("/hero", FILE_FIELD, "me.png")?)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }
}
