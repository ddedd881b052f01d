use std::fs::File;
use std::io;
use std::path::Path;
use zip::ZipArchive;

use super::{ArchiveEntry, ArchiveError, EntryAttributes};

/// Opens an archive and checks every member before anything is extracted.
///
/// Reading a zip member to its end verifies its CRC, so one full pass over
/// all members is the integrity test. Extraction later does not re-check.
pub struct ArchiveValidator;

impl ArchiveValidator {
    /// Validate the archive at `path` and list its entries.
    ///
    /// Fails with [`ArchiveError::NotAnArchive`] when the file is not a zip
    /// container and [`ArchiveError::CorruptArchive`] naming the first member
    /// that does not read back intact.
    pub fn validate(path: &Path) -> Result<ValidatedArchive, ArchiveError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| {
            tracing::debug!(error = %e, path = %path.display(), "Not a zip archive");
            ArchiveError::NotAnArchive
        })?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let checked = match archive.by_index(index) {
                Ok(mut member) => {
                    let name = member.name().to_string();
                    let entry = ArchiveEntry {
                        index,
                        attributes: EntryAttributes::from_zip(
                            &name,
                            member.is_dir(),
                            member.unix_mode(),
                        ),
                        size: member.size(),
                        name,
                    };
                    match io::copy(&mut member, &mut io::sink()) {
                        Ok(_) => Ok(entry),
                        Err(e) => {
                            tracing::debug!(error = %e, entry = %entry.name, "Archive member failed CRC check");
                            Err(Some(entry.name))
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, index, "Archive member could not be opened");
                    Err(None)
                }
            };

            match checked {
                Ok(entry) => entries.push(entry),
                Err(name) => {
                    let name = name.unwrap_or_else(|| Self::member_name(&mut archive, index));
                    return Err(ArchiveError::CorruptArchive(name));
                }
            }
        }

        Ok(ValidatedArchive { archive, entries })
    }

    /// Best-effort name of a member that cannot be opened for reading
    fn member_name(archive: &mut ZipArchive<File>, index: usize) -> String {
        archive
            .by_index_raw(index)
            .map(|member| member.name().to_string())
            .unwrap_or_else(|_| format!("#{}", index))
    }
}

/// An archive that passed validation, with its entries in directory order
pub struct ValidatedArchive {
    archive: ZipArchive<File>,
    entries: Vec<ArchiveEntry>,
}

impl ValidatedArchive {
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn zip_mut(&mut self) -> &mut ZipArchive<File> {
        &mut self.archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    fn write_zip(members: &[(&str, &[u8])]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        {
            let mut zip = ZipWriter::new(file.as_file_mut());
            let options = FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, data) in members {
                if name.ends_with('/') {
                    zip.add_directory(*name, options).unwrap();
                } else {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(data).unwrap();
                }
            }
            zip.finish().unwrap();
        }
        file
    }

    #[test]
    fn test_valid_archive_lists_entries_in_order() {
        let file = write_zip(&[("a/", b""), ("a/one.jpg", b"1"), ("two.png", b"22")]);

        let validated = ArchiveValidator::validate(file.path()).unwrap();
        let names: Vec<&str> = validated.entries().iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["a/", "a/one.jpg", "two.png"]);
        assert!(validated.entries()[0].attributes.is_dir());
        assert_eq!(validated.entries()[2].size, 2);
    }

    #[test]
    fn test_non_zip_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.zip");
        std::fs::write(&path, b"just some text, definitely not a zip").unwrap();

        let err = ArchiveValidator::validate(&path).err().unwrap();
        assert!(matches!(err, ArchiveError::NotAnArchive));
        assert_eq!(err.to_string(), "Uploaded file is not a zip file.");
    }

    #[test]
    fn test_corrupt_member_named() {
        let payload = b"PAYLOAD-PAYLOAD-PAYLOAD";
        let file = write_zip(&[("good.jpg", b"fine"), ("bad.jpg", payload)]);

        // Flip payload bytes in place; stored entries keep data verbatim.
        let mut bytes = std::fs::read(file.path()).unwrap();
        let at = bytes
            .windows(payload.len())
            .position(|w| w == payload)
            .unwrap();
        bytes[at] ^= 0xff;
        std::fs::write(file.path(), &bytes).unwrap();

        let err = ArchiveValidator::validate(file.path()).err().unwrap();
        match err {
            ArchiveError::CorruptArchive(name) => assert_eq!(name, "bad.jpg"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            ArchiveError::CorruptArchive("bad.jpg".to_string()).to_string(),
            "\"bad.jpg\" in the .zip archive is corrupt."
        );
    }
}
