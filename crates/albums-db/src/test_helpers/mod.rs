//! Test helpers
//!
//! In-memory store implementations for exercising the import pipeline and
//! the HTTP layer without a database.

pub mod memory_store;

pub use memory_store::MemoryAttachmentStore;
