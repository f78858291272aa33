//! PNG encoding: functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns bytes out.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Encodes a capture as PNG bytes, ready for upload.
///
/// Lossless on purpose: the server runs OCR over stockpile numbers and
/// JPEG artefacts around small digits hurt recognition.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EncodeError::ZeroDimension);
    }

    let mut png_bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(png_bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Image has zero width or height")]
    ZeroDimension,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    #[test]
    fn encode_produces_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 60));
        let bytes = encode_png(&img).unwrap();
        // PNG magic bytes
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn encoded_png_keeps_dimensions() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(33, 17));
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 17));
    }

    #[test]
    fn encode_zero_dimension_fails() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 50));
        assert!(matches!(encode_png(&img), Err(EncodeError::ZeroDimension)));
    }
}
