//! Test fixtures: encoded images and zip archives built in memory

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// A small solid-colour image in `format`
pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([30, 120, 210])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("Failed to encode image");
    out.into_inner()
}

pub fn png() -> Vec<u8> {
    image_bytes(ImageFormat::Png)
}

pub fn jpeg() -> Vec<u8> {
    image_bytes(ImageFormat::Jpeg)
}

/// Zip the given `(name, bytes)` members in order, deflated
pub fn zip_of(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in members {
            if name.ends_with('/') {
                zip.add_directory(*name, options).expect("Failed to add directory");
            } else {
                zip.start_file(*name, options).expect("Failed to start entry");
                zip.write_all(data).expect("Failed to write entry");
            }
        }
        zip.finish().expect("Failed to finish zip");
    }
    buffer
}
