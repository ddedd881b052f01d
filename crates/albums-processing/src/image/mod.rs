//! Image acceptance
//!
//! A file is an acceptable album image only if it fully decodes. The verdict
//! carries the detected format and dimensions so callers never decode twice.

mod acceptor;

pub use acceptor::{inspect_blocking, DecodingAcceptor, ImageAcceptor};

use ::image::ImageFormat;

/// Format and dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Preferred file extension for the detected format
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

/// Result of inspecting a candidate file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageVerdict {
    Valid(ImageInfo),
    /// Not a decodable image; the string says why
    Invalid(String),
}

impl ImageVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ImageVerdict::Valid(_))
    }
}
