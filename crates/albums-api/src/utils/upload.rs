//! Multipart upload plumbing
//!
//! File fields are streamed chunk by chunk into staged temporary files, never
//! buffered whole. Text fields are kept in arrival order.

use albums_processing::staged::{StagingError, StagingWriter};
use albums_processing::StagedFile;
use axum::extract::Multipart;
use std::path::Path;

/// A file field written to disk
#[derive(Debug)]
pub struct UploadedFile {
    pub file: StagedFile,
    pub filename: String,
}

/// The parsed fields of a multipart form
#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<(String, UploadedFile)>,
    texts: Vec<(String, String)>,
}

impl UploadForm {
    /// Remove and return every file sent under `field`, in arrival order
    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(name, _)| name == field);
        self.files = kept;
        taken.into_iter().map(|(_, file)| file).collect()
    }

    /// Every value sent under `field`, in arrival order
    pub fn texts(&self, field: &str) -> Vec<&str> {
        self.texts
            .iter()
            .filter(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.texts(field).into_iter().next()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormReadError {
    #[error("File too large (max {} MB)", limit / 1024 / 1024)]
    TooLarge { field: String, limit: u64 },

    #[error("Failed to read multipart: {0}")]
    Malformed(String),

    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a whole multipart form, staging every file field in `dir`.
///
/// Each file is capped at `limit` bytes; going over aborts the read and
/// removes everything staged so far.
pub async fn read_upload_form(
    mut multipart: Multipart,
    dir: &Path,
    limit: u64,
) -> Result<UploadForm, FormReadError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| FormReadError::Malformed(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        let Some(filename) = field.file_name().map(str::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|e| FormReadError::Malformed(e.to_string()))?;
            form.texts.push((name, value));
            continue;
        };

        let mut writer = StagingWriter::create_in(dir, "album-upload-", limit)?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| FormReadError::Malformed(e.to_string()))?
        {
            writer.write_chunk(&chunk).await.map_err(|e| match e {
                StagingError::TooLarge { limit } => FormReadError::TooLarge {
                    field: name.clone(),
                    limit,
                },
                StagingError::Io(e) => FormReadError::Io(e),
            })?;
        }

        let file = writer.finish().await.map_err(|e| match e {
            StagingError::TooLarge { limit } => FormReadError::TooLarge {
                field: name.clone(),
                limit,
            },
            StagingError::Io(e) => FormReadError::Io(e),
        })?;

        tracing::debug!(field = %name, filename = %filename, size_bytes = file.size(), "Upload staged");
        form.files.push((name, UploadedFile { file, filename }));
    }

    Ok(form)
}
