//! Owned temporary files
//!
//! A [`StagedFile`] deletes its file when dropped, so every early return in the
//! pipeline cleans up after itself. Promotion into storage disarms it.

use std::io;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// A temporary file owned by exactly one pipeline step at a time
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    pub fn new(path: TempPath, size: u64) -> Self {
        Self { path, size }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written to the file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the file now, reporting failures instead of swallowing them
    pub fn discard(self) -> io::Result<()> {
        self.path.close()
    }

    /// Give up ownership after the file was moved away
    pub(crate) fn disarm(self) {
        // keep() only forgets the path; the file itself is already gone.
        let _ = self.path.keep();
    }
}

/// Error raised while staging an upload
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Upload exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to write upload: {0}")]
    Io(#[from] io::Error),
}

/// Streams an inbound upload to a temporary file chunk by chunk
pub struct StagingWriter {
    file: tokio::fs::File,
    path: TempPath,
    written: u64,
    limit: u64,
}

impl StagingWriter {
    /// Create an empty temporary file in `dir`; `limit` caps the total size
    pub fn create_in(dir: &Path, prefix: &str, limit: u64) -> io::Result<Self> {
        let named = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
        let (file, path) = named.into_parts();

        Ok(Self {
            file: tokio::fs::File::from_std(file),
            path,
            written: 0,
            limit,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        let total = self.written + chunk.len() as u64;
        if total > self.limit {
            return Err(StagingError::TooLarge { limit: self.limit });
        }

        self.file.write_all(chunk).await?;
        self.written = total;
        Ok(())
    }

    /// Flush everything to disk and hand the file over
    pub async fn finish(mut self) -> Result<StagedFile, StagingError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(StagedFile::new(self.path, self.written))
    }
}
