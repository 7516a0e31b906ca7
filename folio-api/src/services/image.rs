//! Image uploads to Cloudinary.
//!
//! The service validates the file locally, then hands it to an
//! [`ImageProvider`]. Transformations are passed to the host as parameters;
//! no image bytes are processed here.

use async_trait::async_trait;
use folio_core::ImageError;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "cloudinary";

pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Largest accepted upload: 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

pub const HERO_FOLDER: &str = "portfolio/hero";
pub const PROJECT_FOLDER: &str = "portfolio/projects";
pub const PROFILE_FOLDER: &str = "portfolio/profile";
pub const PROFILE_TRANSFORMATION: &str = "w_500,h_500,c_fill";

// ============================================================================
// TYPES
// ============================================================================

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Where and how the host should store the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    pub format: String,
    pub transformation: Option<String>,
}

impl UploadOptions {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            format: "webp".to_string(),
            transformation: None,
        }
    }

    pub fn with_transformation(mut self, transformation: impl Into<String>) -> Self {
        self.transformation = Some(transformation.into());
        self
    }
}

/// Stored image as reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
    pub public_id: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    pub created_at: String,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn upload(
        &self,
        upload: ImageUpload,
        options: UploadOptions,
    ) -> Result<UploadResult, ImageError>;

    fn provider_name(&self) -> &'static str;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub api_base: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudinaryConfig {
    /// Load from `CLOUDINARY_NAME`, `CLOUDINARY_APIKEY` and
    /// `CLOUDINARY_APISECRET`. Returns `None` unless all three are set.
    pub fn from_env() -> Option<Self> {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            cloud_name: read("CLOUDINARY_NAME")?,
            api_key: read("CLOUDINARY_APIKEY")?,
            api_secret: SecretString::from(read("CLOUDINARY_APISECRET")?),
            api_base: DEFAULT_CLOUDINARY_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.api_base, self.cloud_name)
    }
}

// ============================================================================
// SIGNING
// ============================================================================

/// `<unix>_<file stem>`.
pub fn public_id_for(filename: &str, timestamp: i64) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{}_{}", timestamp, stem)
}

/// SHA-256 hex of the sorted `k=v&...` parameter string followed by the secret.
pub fn sign_params(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn signed_params(
    options: &UploadOptions,
    public_id: &str,
    timestamp: i64,
) -> BTreeMap<&'static str, String> {
    let mut params = BTreeMap::new();
    params.insert("folder", options.folder.clone());
    params.insert("format", options.format.clone());
    params.insert("public_id", public_id.to_string());
    params.insert("timestamp", timestamp.to_string());
    if let Some(transformation) = &options.transformation {
        params.insert("transformation", transformation.clone());
    }
    params
}

// ============================================================================
// CLOUDINARY PROVIDER
// ============================================================================

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

fn upload_failed(reason: impl Into<String>) -> ImageError {
    ImageError::UploadFailed {
        provider: PROVIDER,
        reason: reason.into(),
    }
}

#[derive(Debug)]
pub struct CloudinaryProvider {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryProvider {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| upload_failed(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageProvider for CloudinaryProvider {
    async fn upload(
        &self,
        upload: ImageUpload,
        options: UploadOptions,
    ) -> Result<UploadResult, ImageError> {
        let timestamp = chrono::Utc::now().timestamp();
        let public_id = public_id_for(&upload.filename, timestamp);
        let params = signed_params(&options, &public_id, timestamp);
        let signature = sign_params(&params, self.config.api_secret.expose_secret());

        let mut file = Part::bytes(upload.bytes).file_name(upload.filename.clone());
        if let Some(content_type) = &upload.content_type {
            file = file
                .mime_str(content_type)
                .map_err(|e| upload_failed(format!("Invalid content type: {}", e)))?;
        }

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_failed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<CloudinaryErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(upload_failed(format!("status {}: {}", status.as_u16(), message)));
        }

        let body: CloudinaryResponse = response
            .json()
            .await
            .map_err(|e| upload_failed(format!("Failed to parse response: {}", e)))?;

        tracing::info!(public_id = %body.public_id, folder = %options.folder, "Image uploaded");

        Ok(UploadResult {
            url: body.secure_url,
            public_id: body.public_id,
            format: body.format,
            width: body.width,
            height: body.height,
            bytes: body.bytes,
            created_at: body.created_at,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// ============================================================================
// IMAGE SERVICE
// ============================================================================

/// Validates uploads and routes them to per-section folders.
#[derive(Clone, Default)]
pub struct ImageService {
    provider: Option<Arc<dyn ImageProvider>>,
}

impl ImageService {
    pub fn new(provider: Option<Arc<dyn ImageProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Check the extension and size of an upload.
    pub fn validate(upload: &ImageUpload) -> Result<(), ImageError> {
        let extension = Path::new(&upload.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or(ImageError::InvalidFileType)?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ImageError::InvalidFileType);
        }
        if upload.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge);
        }
        Ok(())
    }

    pub async fn upload(
        &self,
        upload: ImageUpload,
        options: UploadOptions,
    ) -> Result<UploadResult, ImageError> {
        let provider = self.provider.as_ref().ok_or(ImageError::NotConfigured)?;
        Self::validate(&upload)?;
        provider.upload(upload, options).await
    }

    pub async fn upload_hero(&self, upload: ImageUpload) -> Result<UploadResult, ImageError> {
        self.upload(upload, UploadOptions::new(HERO_FOLDER)).await
    }

    pub async fn upload_project(&self, upload: ImageUpload) -> Result<UploadResult, ImageError> {
        self.upload(upload, UploadOptions::new(PROJECT_FOLDER)).await
    }

    pub async fn upload_profile(&self, upload: ImageUpload) -> Result<UploadResult, ImageError> {
        self.upload(
            upload,
            UploadOptions::new(PROFILE_FOLDER).with_transformation(PROFILE_TRANSFORMATION),
        )
        .await
    }
}
