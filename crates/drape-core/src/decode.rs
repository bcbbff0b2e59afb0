//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! straight-alpha RGBA image ready to be uploaded to a drawing surface.

use image::RgbaImage;

use crate::types::Dimensions;

/// Why a byte buffer could not be turned into an image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("input image is empty")]
    Empty,

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode raw image bytes into RGBA.
///
/// # Errors
///
/// Returns [`DecodeError::Empty`] if `bytes` is empty.
/// Returns [`DecodeError::Image`] if the format is unrecognized or the
/// data is corrupt.
#[must_use = "returns the decoded image"]
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Read the pixel size from the image header without decoding pixels.
///
/// # Errors
///
/// Same as [`decode_rgba`].
pub fn read_dimensions(bytes: &[u8]) -> Result<Dimensions, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (width, height) = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .into_dimensions()?;
    Ok(Dimensions { width, height })
}

/// Encode straight-alpha RGBA as PNG.
///
/// # Errors
///
/// Returns the encoder's error if the buffer is inconsistent with the
/// image dimensions.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode_rgba(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn corrupt_bytes_returns_image_error() {
        let result = decode_rgba(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(DecodeError::Image(_))));
    }

    #[test]
    fn dimensions_come_from_header() {
        let img = RgbaImage::new(7, 3);
        let size = read_dimensions(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(
            size,
            Dimensions {
                width: 7,
                height: 3
            }
        );
        assert!(matches!(read_dimensions(b"nope"), Err(DecodeError::Image(_))));
    }

    #[test]
    fn png_preserves_alpha() {
        let img = RgbaImage::from_fn(3, 2, |x, y| {
            image::Rgba([10 * x as u8, 20 * y as u8, 30, if x == 0 { 0 } else { 200 }])
        });
        let decoded = decode_rgba(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }
}
