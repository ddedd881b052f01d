//! Album database layer
//!
//! Repositories for attachments and the per-owner denormalized stats, plus the
//! store traits the import pipeline and HTTP handlers program against.

// Module declarations
pub mod db;
pub mod store_traits;
pub mod test_helpers;

// Re-exports
pub use db::{AttachmentRepository, AlbumStatsRepository};
pub use store_traits::{AlbumStatsStore, AttachmentStore};
