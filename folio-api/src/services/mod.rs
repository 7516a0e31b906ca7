//! Service Layer
//!
//! Orchestration between handlers and repositories. Services return domain
//! errors; the HTTP boundary maps them to status codes.

pub mod image;
pub mod items;
pub mod pages;
pub mod summarizer;
pub mod testimony;

pub use image::{
    CloudinaryConfig, CloudinaryProvider, ImageProvider, ImageService, ImageUpload,
    UploadOptions, UploadResult,
};
pub use items::ItemService;
pub use pages::{PageService, PageSection};
pub use summarizer::{OpenRouterSummarizer, SummarizerConfig, TestimonySummarizer};
pub use testimony::TestimonyService;
