//! # Menu Photo Preprocessing
//!
//! Phone photos are often rotated via EXIF and far larger than a vision model
//! needs. Before upload the photo is oriented, bounded to
//! [`MAX_UPLOAD_DIMENSION`] on its longer edge and re-encoded as JPEG.
//! A photo the decoder cannot handle is sent unmodified.

use crate::constants::MAX_UPLOAD_DIMENSION;
use image::{imageops::FilterType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

pub const CANONICAL_MIME_TYPE: &str = "image/jpeg";

/// Image bytes ready to be sent to the vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Orients, downscales and re-encodes a menu photo, falling back to the raw bytes.
pub fn prepare_menu_image(bytes: &[u8], mime_type: &str) -> PreparedImage {
    match reencode(bytes, MAX_UPLOAD_DIMENSION) {
        Ok(encoded) => {
            debug!(
                original_bytes = bytes.len(),
                prepared_bytes = encoded.len(),
                "Menu image re-encoded for upload"
            );
            PreparedImage {
                bytes: encoded,
                mime_type: CANONICAL_MIME_TYPE.to_string(),
            }
        }
        Err(e) => {
            warn!("Image preprocessing failed, sending original bytes: {e}");
            PreparedImage {
                bytes: bytes.to_vec(),
                mime_type: mime_type.to_string(),
            }
        }
    }
}

fn reencode(bytes: &[u8], max_dimension: u32) -> image::ImageResult<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    if img.width().max(img.height()) > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}

/// Guesses an upload MIME type from a file extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}
