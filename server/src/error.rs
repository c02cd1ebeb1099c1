//! Error types for the report service
//!
//! All errors use thiserror for structured error handling.
//! The HTTP boundary maps each variant to a status code and a JSON envelope
//! (see `api::response`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("File too large (limit is {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),
}

impl AppError {
    /// Errors raised while accepting a photo upload. These are
    /// user-correctable and reported as a failed upload.
    pub fn is_upload_error(&self) -> bool {
        matches!(
            self,
            AppError::PayloadTooLarge { .. }
                | AppError::UnsupportedMediaType(_)
                | AppError::Upload(_)
        )
    }

    /// Errors that point at a server-side fault rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Io(_) | AppError::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
