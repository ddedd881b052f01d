//! Direct image uploads
//!
//! Single images go through the same decode check and promotion as archive
//! entries, with validation of every file before anything is stored.

mod images;
mod validator;

pub use images::{CheckedImage, ImageUploader, PendingImage};
pub use validator::UploadValidator;

use albums_core::AppError;
use albums_storage::StorageError;

use crate::import::OrderExhausted;

/// Message shown for files that do not decode as images
pub const INVALID_IMAGE_MESSAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("The submitted file is empty.")]
    EmptyFile,

    #[error("{}", INVALID_IMAGE_MESSAGE)]
    InvalidImage,

    #[error("Failed to store image: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to record image: {0}")]
    Store(#[from] AppError),

    #[error(transparent)]
    Order(#[from] OrderExhausted),

    #[error("Upload I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UploadError {
    /// Whether the uploaded file itself was at fault
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            UploadError::FileTooLarge { .. }
                | UploadError::InvalidExtension { .. }
                | UploadError::InvalidFilename(_)
                | UploadError::EmptyFile
                | UploadError::InvalidImage
                | UploadError::Order(_)
        )
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            e @ UploadError::FileTooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            e @ (UploadError::InvalidExtension { .. }
            | UploadError::InvalidFilename(_)
            | UploadError::EmptyFile
            | UploadError::InvalidImage) => AppError::InvalidInput(e.to_string()),
            UploadError::Storage(e) => AppError::from(e),
            UploadError::Store(e) => e,
            UploadError::Order(e) => AppError::BadRequest(e.to_string()),
            UploadError::Io(e) => AppError::from(e),
            UploadError::Join(e) => AppError::Internal(format!("Upload task failed: {}", e)),
        }
    }
}
