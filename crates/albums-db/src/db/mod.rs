//! Database repositories for data access layer
//!
//! Postgres implementations of the store traits.

pub mod attachment;
pub mod stats;

pub use attachment::AttachmentRepository;
pub use stats::AlbumStatsRepository;
