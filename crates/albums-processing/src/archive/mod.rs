//! Zip archive handling: validation, entry selection and streaming extraction

mod extractor;
mod filter;
mod validator;

pub use extractor::StreamExtractor;
pub use filter::{DefaultEntryFilter, EntryFilter, ImageEntryFilter};
pub use validator::{ArchiveValidator, ValidatedArchive};

use crate::staged::StagedFile;
use std::io;
use std::path::Path;

/// Archive-level failures. The messages are shown to the uploader as-is.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Uploaded file is not a zip file.")]
    NotAnArchive,

    #[error("\"{0}\" in the .zip archive is corrupt.")]
    CorruptArchive(String),

    #[error("Chunk size {requested} is below the minimum of {minimum} bytes")]
    ChunkSizeTooSmall { requested: usize, minimum: usize },

    #[error("Failed to read archive: {0}")]
    Io(#[from] io::Error),
}

/// Attribute bits of an archive entry (low byte follows the DOS layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryAttributes(u32);

impl EntryAttributes {
    /// Set when the entry is a directory
    pub const DIR_BIT: u32 = 0x10;

    const S_IFMT: u32 = 0o170000;
    const S_IFDIR: u32 = 0o040000;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR_BIT != 0
    }

    /// Derive the attributes from what the zip central directory reports.
    ///
    /// DOS directory flags surface through `unix_mode` as `S_IFDIR`, and some
    /// writers only mark directories with a trailing slash.
    pub fn from_zip(name: &str, is_dir: bool, unix_mode: Option<u32>) -> Self {
        let unix_dir = unix_mode.is_some_and(|mode| mode & Self::S_IFMT == Self::S_IFDIR);
        if is_dir || unix_dir || name.ends_with('/') {
            Self(Self::DIR_BIT)
        } else {
            Self(0)
        }
    }
}

/// One member of an archive as listed in its central directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in the central directory
    pub index: usize,
    /// Full name including any directory prefix
    pub name: String,
    /// Uncompressed size
    pub size: u64,
    pub attributes: EntryAttributes,
}

impl ArchiveEntry {
    /// Final path component of the entry name
    pub fn file_name(&self) -> &str {
        flatten_name(&self.name)
    }
}

/// Strip any directory prefix from an archive entry name.
///
/// Handles both `/` and `\` separators since archives made on Windows use the latter.
pub fn flatten_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("")
}

/// The uploaded archive's temporary copy on disk.
///
/// Removed when dropped; [`UploadedArchive::remove`] reports removal failures.
#[derive(Debug)]
pub struct UploadedArchive {
    file: StagedFile,
}

impl UploadedArchive {
    pub fn new(file: StagedFile) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.file.size()
    }

    /// Delete the archive file
    pub fn remove(self) -> io::Result<()> {
        match self.file.discard() {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_from_zip_metadata() {
        assert!(EntryAttributes::from_zip("photos/", false, None).is_dir());
        assert!(EntryAttributes::from_zip("photos", true, None).is_dir());
        assert!(EntryAttributes::from_zip("photos", false, Some(0o040755)).is_dir());
        assert!(!EntryAttributes::from_zip("photo.jpg", false, Some(0o100644)).is_dir());
        assert_eq!(
            EntryAttributes::from_zip("x/", false, None).bits(),
            EntryAttributes::DIR_BIT
        );
    }

    #[test]
    fn test_flatten_name() {
        assert_eq!(flatten_name("holiday/2024/photo1.jpg"), "photo1.jpg");
        assert_eq!(flatten_name("photo1.jpg"), "photo1.jpg");
        assert_eq!(flatten_name("dir\\sub\\pic.png"), "pic.png");
        assert_eq!(flatten_name("../evil.gif"), "evil.gif");
        assert_eq!(flatten_name("folder/"), "folder");
        assert_eq!(flatten_name(".."), "");
    }
}
