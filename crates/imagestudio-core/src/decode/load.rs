//! Source image decoding with format detection and EXIF orientation handling.
//!
//! Browsers honour the EXIF orientation tag when they draw an `<img>`, so the
//! natural dimensions a user sees (and crops against) are the oriented ones.
//! Decoding here applies the same correction before anything else touches
//! the pixels.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, Orientation, Raster, SourceFormat};

/// A decoded source image together with the format it was stored in.
#[derive(Debug, Clone)]
pub struct DecodedSource {
    /// Oriented RGBA pixels.
    pub raster: Raster,
    /// Detected container format.
    pub format: SourceFormat,
}

/// Detect the container format of encoded image bytes.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes do not start with a
/// signature of one of the supported formats.
pub fn detect_format(bytes: &[u8]) -> Result<SourceFormat, DecodeError> {
    let format = image::guess_format(bytes).map_err(|_| DecodeError::InvalidFormat)?;
    SourceFormat::from_image_format(format).ok_or(DecodeError::InvalidFormat)
}

/// Decode image bytes into an oriented RGBA raster.
///
/// # Errors
///
/// * `DecodeError::InvalidFormat` if the format is not recognized.
/// * `DecodeError::CorruptedFile` if the data is truncated or malformed.
/// * `DecodeError::EmptyImage` if the image has a zero dimension.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedSource, DecodeError> {
    let format = detect_format(bytes)?;
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let rgba = apply_orientation(img, orientation).into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    Ok(DecodedSource {
        raster: Raster::from_rgba_image(rgba),
        format,
    })
}

/// Extract EXIF orientation from encoded bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encoded_jpeg, encoded_png};

    #[test]
    fn test_decode_png() {
        let bytes = encoded_png(40, 30);
        let decoded = decode_image(&bytes).unwrap();

        assert_eq!(decoded.format, SourceFormat::Png);
        assert_eq!(decoded.raster.width, 40);
        assert_eq!(decoded.raster.height, 30);
        assert_eq!(decoded.raster.pixels.len(), 40 * 30 * 4);
    }

    #[test]
    fn test_decode_jpeg() {
        let bytes = encoded_jpeg(16, 8);
        let decoded = decode_image(&bytes).unwrap();

        assert_eq!(decoded.format, SourceFormat::Jpeg);
        assert_eq!((decoded.raster.width, decoded.raster.height), (16, 8));
        // JPEG has no alpha channel, everything decodes opaque
        assert!(decoded.raster.pixels.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_decode_garbage_is_invalid_format() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = encoded_png(40, 30);
        let result = decode_image(&bytes[..bytes.len() / 2]);

        match result {
            Err(DecodeError::CorruptedFile(_)) => {}
            Err(e) => panic!("Expected CorruptedFile error, got: {:?}", e),
            Ok(_) => panic!("Expected error, got success"),
        }
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(&encoded_png(2, 2)).unwrap(), SourceFormat::Png);
        assert_eq!(detect_format(&encoded_jpeg(2, 2)).unwrap(), SourceFormat::Jpeg);
    }

    #[test]
    fn test_orientation_without_exif() {
        assert_eq!(extract_orientation(&encoded_png(4, 4)), Orientation::Normal);
        assert_eq!(extract_orientation(&[0xFF, 0x00]), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_rotate90() {
        let pixels = vec![
            255, 0, 0, 255, // Red (left)
            0, 255, 0, 255, // Green (right)
        ];
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_raw(2, 1, pixels).unwrap());

        let result = apply_orientation(img, Orientation::Rotate90CW).into_rgba8();
        assert_eq!(result.dimensions(), (1, 2));
        assert_eq!(result.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let pixels = vec![
            255, 0, 0, 255, // Red (left)
            0, 255, 0, 255, // Green (right)
        ];
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_raw(2, 1, pixels).unwrap());

        let result = apply_orientation(img, Orientation::FlipHorizontal).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
