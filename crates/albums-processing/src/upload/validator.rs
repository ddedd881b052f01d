use std::path::Path;

use super::UploadError;

/// Checks a direct upload's size and file name before it is decoded
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), UploadError> {
        if size == 0 {
            return Err(UploadError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<String, UploadError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| UploadError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Validate everything that can be checked without reading the file
    pub fn validate_all(&self, filename: &str, size: u64) -> Result<String, UploadError> {
        self.validate_file_size(size)?;
        self.validate_extension(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UploadValidator {
        UploadValidator::new(1024, vec!["jpg".to_string(), "PNG".to_string()])
    }

    #[test]
    fn test_validate_file_size() {
        let v = validator();

        assert!(v.validate_file_size(1024).is_ok());
        assert!(matches!(v.validate_file_size(0), Err(UploadError::EmptyFile)));
        assert!(matches!(
            v.validate_file_size(1025),
            Err(UploadError::FileTooLarge { size: 1025, max: 1024 })
        ));
    }

    #[test]
    fn test_validate_extension() {
        let v = validator();

        assert_eq!(v.validate_extension("holiday.JPG").unwrap(), "jpg");
        assert_eq!(v.validate_extension("x.png").unwrap(), "png");
        assert!(matches!(
            v.validate_extension("notes.txt"),
            Err(UploadError::InvalidExtension { .. })
        ));
        assert!(matches!(
            v.validate_extension("noextension"),
            Err(UploadError::InvalidFilename(_))
        ));
    }
}
