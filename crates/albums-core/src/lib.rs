//! Photo albums core library
//!
//! Domain models, error types and configuration shared by the storage,
//! database, import pipeline and HTTP crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AlbumsConfig, BaseConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::OwnerRef;
pub use storage_types::StorageBackend;
