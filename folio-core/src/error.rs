//! Error types for Folio operations

use crate::entities::ItemId;
use thiserror::Error;

/// Validation errors raised before anything reaches the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    RequiredFieldMissing { field: &'static str },

    #[error("rating must be between 1 and 5, got {rating}")]
    RatingOutOfRange { rating: i32 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// A singleton page row has never been written.
    #[error("{page} page not found")]
    PageNotFound { page: &'static str },

    #[error("{entity} {id} not found")]
    ItemNotFound { entity: &'static str, id: ItemId },

    /// Stored data no longer matches the domain model.
    #[error("Corrupt {entity} row: {reason}")]
    Corrupt { entity: &'static str, reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    pub fn backend(reason: impl std::fmt::Display) -> Self {
        StorageError::Backend {
            reason: reason.to_string(),
        }
    }
}

/// Failures from the testimony summarization provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummarizerError {
    #[error("No summarization provider configured")]
    NotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("Transport error talking to {provider}: {reason}")]
    Transport {
        provider: &'static str,
        reason: String,
    },
}

/// Failures from the image hosting provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image uploads are not configured")]
    NotConfigured,

    #[error("invalid file type. Allowed: jpg, jpeg, png, webp, gif")]
    InvalidFileType,

    #[error("file too large (max 5MB)")]
    TooLarge,

    #[error("Upload to {provider} failed: {reason}")]
    UploadFailed {
        provider: &'static str,
        reason: String,
    },
}

/// Top-level error for service operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FolioError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Summarizer(#[from] SummarizerError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

pub type FolioResult<T> = Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_not_found_message() {
        let err = StorageError::PageNotFound { page: "Hero" };
        assert_eq!(err.to_string(), "Hero page not found");
    }

    #[test]
    fn test_validation_converts_into_folio_error() {
        let err: FolioError = ValidationError::RatingOutOfRange { rating: 9 }.into();
        assert!(matches!(err, FolioError::Validation(_)));
        assert_eq!(err.to_string(), "rating must be between 1 and 5, got 9");
    }
}
