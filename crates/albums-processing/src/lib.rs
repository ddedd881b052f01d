//! Album import pipeline
//!
//! Turns an uploaded zip archive into ordered album attachments:
//!
//! 1. [`archive::ArchiveValidator`] checks every member's CRC before anything is trusted.
//! 2. An [`archive::EntryFilter`] picks the entries worth extracting.
//! 3. [`archive::StreamExtractor`] copies one entry at a time to a temporary file
//!    through a fixed-size buffer.
//! 4. An [`image::ImageAcceptor`] decodes the file; rejects are deleted.
//! 5. [`import::OrderAssigner`] stamps accepted images with increasing ordering values
//!    and [`import::AlbumImageProcessor`] promotes and records them.
//!
//! [`import::ImportCoordinator`] drives the steps and always removes the archive.
//! The [`upload`] module reuses the same acceptance and promotion steps for
//! images uploaded one by one.

pub mod archive;
pub mod image;
pub mod import;
pub mod staged;
pub mod upload;

// Re-export commonly used types
pub use archive::{
    ArchiveEntry, ArchiveError, ArchiveValidator, DefaultEntryFilter, EntryAttributes,
    EntryFilter, ImageEntryFilter, StreamExtractor, UploadedArchive, ValidatedArchive,
};
pub use self::image::{DecodingAcceptor, ImageAcceptor, ImageInfo, ImageVerdict};
pub use import::{
    promote, AlbumImageProcessor, EntryProcessor, ImportCoordinator, ImportError, ImportReport,
    ImportState, OrderAssigner, OrderExhausted,
};
pub use staged::{StagedFile, StagingError, StagingWriter};
pub use upload::{CheckedImage, ImageUploader, PendingImage, UploadError, UploadValidator};
