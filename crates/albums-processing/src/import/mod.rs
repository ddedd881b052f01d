//! Archive import: drives validation, filtering, extraction and per-entry
//! processing, then finalizes the batch

mod album;
mod coordinator;
mod order;

pub use album::{promote, AlbumImageProcessor};
pub use coordinator::{EntryProcessor, ImportCoordinator, ImportState};
pub use order::{OrderAssigner, OrderExhausted};

use albums_core::AppError;
use albums_storage::StorageError;

use crate::archive::ArchiveError;

/// Errors that abort a whole import batch.
///
/// A single undecodable image is never one of these; it is discarded and the
/// batch continues.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Import I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to store image: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to record image: {0}")]
    Store(#[from] AppError),

    #[error(transparent)]
    Order(#[from] OrderExhausted),

    #[error("Import task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ImportError {
    /// Archive-level failures are the uploader's fault and reported on the form
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ImportError::Archive(ArchiveError::NotAnArchive | ArchiveError::CorruptArchive(_))
                | ImportError::Order(_)
        )
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Archive(e @ (ArchiveError::NotAnArchive | ArchiveError::CorruptArchive(_))) => {
                AppError::BadRequest(e.to_string())
            }
            ImportError::Archive(e) => AppError::Internal(e.to_string()),
            ImportError::Io(e) => AppError::from(e),
            ImportError::Storage(e) => AppError::from(e),
            ImportError::Store(e) => e,
            ImportError::Order(e) => AppError::BadRequest(e.to_string()),
            ImportError::Join(e) => AppError::Internal(format!("Import task failed: {}", e)),
        }
    }
}

/// Outcome of a completed batch
#[derive(Debug, Clone)]
pub struct ImportReport<O> {
    /// Entries in the archive, directories included
    pub total_entries: usize,
    /// Entries that passed the filter and were extracted
    pub selected: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// What the entry processor produced at the end of the batch
    pub output: O,
}
