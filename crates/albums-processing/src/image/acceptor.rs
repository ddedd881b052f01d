use ::image::ImageReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ImageInfo, ImageVerdict};

/// Judges whether a file on disk is a usable image
pub trait ImageAcceptor: Send + Sync {
    fn inspect(&self, path: &Path) -> ImageVerdict;
}

/// Accepts files that decode completely with the `image` crate.
///
/// The format is sniffed from content, never from the file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingAcceptor;

impl ImageAcceptor for DecodingAcceptor {
    fn inspect(&self, path: &Path) -> ImageVerdict {
        let reader = match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
            Ok(reader) => reader,
            Err(e) => return ImageVerdict::Invalid(e.to_string()),
        };

        let Some(format) = reader.format() else {
            return ImageVerdict::Invalid("Unrecognized image format".to_string());
        };

        match reader.decode() {
            Ok(img) => ImageVerdict::Valid(ImageInfo {
                format,
                width: img.width(),
                height: img.height(),
            }),
            Err(e) => ImageVerdict::Invalid(e.to_string()),
        }
    }
}

/// Run an acceptor on the blocking pool. Decoding is CPU-bound.
pub async fn inspect_blocking(
    acceptor: Arc<dyn ImageAcceptor>,
    path: PathBuf,
) -> Result<ImageVerdict, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || acceptor.inspect(&path)).await
}
