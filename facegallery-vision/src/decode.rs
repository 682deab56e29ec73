use image::{GenericImageView, ImageFormat};

use crate::error::DecodeError;

/// Formats the gallery accepts on upload and search.
pub const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Decoded image as a row-major RGBA buffer (4 bytes per pixel).
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub fn is_accepted(format: ImageFormat) -> bool {
    ACCEPTED_FORMATS.contains(&format)
}

/// Sniff the container format from the leading bytes and check it is one we accept.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    let format = image::guess_format(bytes).map_err(|_| DecodeError::Unrecognized)?;
    if !is_accepted(format) {
        return Err(DecodeError::UnsupportedFormat(
            format.to_mime_type().to_string(),
        ));
    }
    Ok(format)
}

/// Decode JPEG/PNG/GIF/WebP bytes into RGBA pixels.
pub fn decode_rgba(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let format = sniff_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroDimensions);
    }

    Ok(DecodedImage {
        width,
        height,
        rgba: img.to_rgba8().into_raw(),
    })
}
