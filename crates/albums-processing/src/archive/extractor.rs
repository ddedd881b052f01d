use albums_core::constants::MIN_CHUNK_SIZE;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::{ArchiveEntry, ArchiveError, ValidatedArchive};
use crate::staged::StagedFile;

/// Copies archive entries to temporary files through a fixed-size buffer.
///
/// Memory use per entry is one chunk regardless of the entry's size.
#[derive(Debug, Clone)]
pub struct StreamExtractor {
    temp_dir: PathBuf,
    chunk_size: usize,
}

impl StreamExtractor {
    /// Extractor writing into `temp_dir` with the default 64 KiB chunk size
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            chunk_size: MIN_CHUNK_SIZE,
        }
    }

    /// Use a larger read chunk. Values below 64 KiB are rejected because the
    /// decompressor already buffers at least that much.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self, ArchiveError> {
        if chunk_size < MIN_CHUNK_SIZE {
            return Err(ArchiveError::ChunkSizeTooSmall {
                requested: chunk_size,
                minimum: MIN_CHUNK_SIZE,
            });
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Extract one entry of a validated archive into a fresh temporary file
    pub fn extract(
        &self,
        archive: &mut ValidatedArchive,
        entry: &ArchiveEntry,
    ) -> io::Result<StagedFile> {
        self.extract_from(archive.zip_mut(), entry)
    }

    /// Extract one entry of any zip archive into a fresh temporary file.
    ///
    /// A partially written file is removed before the error is returned.
    pub fn extract_from<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        entry: &ArchiveEntry,
    ) -> io::Result<StagedFile> {
        let mut source = archive
            .by_index(entry.index)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        let named = tempfile::Builder::new()
            .prefix("album-entry-")
            .tempfile_in(&self.temp_dir)?;
        let (mut file, path) = named.into_parts();

        let mut buffer = vec![0u8; self.chunk_size];
        let mut written: u64 = 0;
        loop {
            let read = match source.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            file.write_all(&buffer[..read])?;
            written += read as u64;
        }
        file.flush()?;

        tracing::debug!(
            entry = %entry.name,
            path = %path.display(),
            size_bytes = written,
            "Archive entry extracted"
        );

        Ok(StagedFile::new(path, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveValidator, EntryAttributes};
    use std::io::Cursor;
    use tempfile::{tempdir, NamedTempFile};
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    #[test]
    fn test_chunk_size_below_minimum_rejected() {
        let err = StreamExtractor::new("/tmp")
            .with_chunk_size(MIN_CHUNK_SIZE - 1)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::ChunkSizeTooSmall { .. }));

        let extractor = StreamExtractor::new("/tmp")
            .with_chunk_size(2 * MIN_CHUNK_SIZE)
            .unwrap();
        assert_eq!(extractor.chunk_size(), 2 * MIN_CHUNK_SIZE);
    }

    #[test]
    fn test_large_entry_streams_byte_for_byte() {
        // Several chunks plus a partial one
        let data: Vec<u8> = (0..(3 * MIN_CHUNK_SIZE + 1234))
            .map(|i| (i % 251) as u8)
            .collect();

        let mut file = NamedTempFile::new().unwrap();
        {
            let mut zip = ZipWriter::new(file.as_file_mut());
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file("big.bin", options).unwrap();
            zip.write_all(&data).unwrap();
            zip.finish().unwrap();
        }

        let dir = tempdir().unwrap();
        let mut archive = ArchiveValidator::validate(file.path()).unwrap();
        let entry = archive.entries()[0].clone();

        let staged = StreamExtractor::new(dir.path())
            .extract(&mut archive, &entry)
            .unwrap();

        assert_eq!(staged.size(), data.len() as u64);
        assert_eq!(std::fs::read(staged.path()).unwrap(), data);
        assert!(staged.path().starts_with(dir.path()));
    }

    #[test]
    fn test_each_entry_gets_its_own_file() {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = FileOptions::default();
            zip.start_file("a.jpg", options).unwrap();
            zip.write_all(b"first").unwrap();
            zip.start_file("b.jpg", options).unwrap();
            zip.write_all(b"second").unwrap();
            zip.finish().unwrap();
        }

        let dir = tempdir().unwrap();
        let extractor = StreamExtractor::new(dir.path());
        let mut archive = ZipArchive::new(Cursor::new(buffer)).unwrap();
        let entry = |index: usize, name: &str| ArchiveEntry {
            index,
            name: name.to_string(),
            size: 0,
            attributes: EntryAttributes::default(),
        };

        let first = extractor.extract_from(&mut archive, &entry(0, "a.jpg")).unwrap();
        let second = extractor.extract_from(&mut archive, &entry(1, "b.jpg")).unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read(first.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"second");

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
    }
}
