//! Album storage library
//!
//! Storage abstraction for album images with local filesystem and S3 backends.
//!
//! # Storage key format
//!
//! All backends use the same key layout:
//!
//! - `albums/{owner_type}/{owner_id}/{stem}.{ext}`
//!
//! where `stem` is the image's ordering value for archive imports and a random
//! id for direct uploads. Keys must not contain `..` or a leading `/`.
//!
//! # Promotion
//!
//! Backends report through [`Storage::supports_rename`] whether
//! [`Storage::move_file`] is a same-filesystem rename. Callers promoting large
//! temporary files check the flag and fall back to [`Storage::upload_file`]
//! (a bounded-buffer streaming copy) otherwise.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use albums_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{album_object_key, normalized_extension};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
