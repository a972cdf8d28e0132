//! Raster encoding to JPEG, PNG and WebP.
//!
//! Encoding goes through the `image` crate's encoders. Quality is expressed
//! as a fraction in (0, 1], the same scale the browser's `toBlob` uses.
//! PNG ignores it. The WebP encoder is lossless, so for WebP the quality
//! sets how far colours are posterized before encoding.

use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{Raster, SourceFormat};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Quality outside (0, 1]
    #[error("Invalid quality {0}: must be in (0, 1]")]
    InvalidQuality(f64),

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// A format the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    Jpeg,
    Png,
    Webp,
}

impl EncodeFormat {
    /// Encodable counterpart of a source format, if there is one.
    pub fn from_source(format: SourceFormat) -> Option<Self> {
        match format {
            SourceFormat::Jpeg => Some(EncodeFormat::Jpeg),
            SourceFormat::Png => Some(EncodeFormat::Png),
            SourceFormat::Webp => Some(EncodeFormat::Webp),
            SourceFormat::Gif | SourceFormat::Bmp => None,
        }
    }

    /// File extension used for exported files, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            EncodeFormat::Jpeg => "jpg",
            EncodeFormat::Png => "png",
            EncodeFormat::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            EncodeFormat::Jpeg => "image/jpeg",
            EncodeFormat::Png => "image/png",
            EncodeFormat::Webp => "image/webp",
        }
    }

    /// True if the encoder ignores the quality parameter for this format.
    pub fn is_lossless(self) -> bool {
        matches!(self, EncodeFormat::Png)
    }

    fn label(self) -> &'static str {
        match self {
            EncodeFormat::Jpeg => "JPEG",
            EncodeFormat::Png => "PNG",
            EncodeFormat::Webp => "WebP",
        }
    }
}

/// Requested output format, as chosen in the batch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Keep the format the asset was loaded in.
    #[default]
    Original,
    Jpeg,
    Png,
    Webp,
}

/// Pick the concrete output format.
///
/// `Original` reuses the source format when it can be encoded and falls
/// back to PNG otherwise. When a byte-size target is set, PNG is replaced
/// by JPEG since there is no quality to search over.
pub fn resolve_format(
    target: TargetFormat,
    source: SourceFormat,
    has_size_target: bool,
) -> EncodeFormat {
    let format = match target {
        TargetFormat::Original => EncodeFormat::from_source(source).unwrap_or(EncodeFormat::Png),
        TargetFormat::Jpeg => EncodeFormat::Jpeg,
        TargetFormat::Png => EncodeFormat::Png,
        TargetFormat::Webp => EncodeFormat::Webp,
    };

    if has_size_target && format.is_lossless() {
        EncodeFormat::Jpeg
    } else {
        format
    }
}

/// Map a (0, 1] quality onto the JPEG encoder's 1-100 scale.
pub fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Turns a raster into encoded bytes.
///
/// The target-size search only talks to this trait, so it can be driven by
/// an encoder with a known size curve.
pub trait RasterEncoder {
    fn encode(
        &self,
        raster: &Raster,
        format: EncodeFormat,
        quality: f64,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Production encoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl RasterEncoder for ImageCodec {
    fn encode(
        &self,
        raster: &Raster,
        format: EncodeFormat,
        quality: f64,
    ) -> Result<Vec<u8>, EncodeError> {
        validate(raster, quality)?;

        let mut buffer = Cursor::new(Vec::new());
        let failed = |e: image::ImageError| EncodeError::EncodingFailed {
            format: format.label(),
            message: e.to_string(),
        };

        match format {
            EncodeFormat::Jpeg => {
                let rgb = flatten_onto_black(&raster.pixels);
                JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality))
                    .write_image(&rgb, raster.width, raster.height, ExtendedColorType::Rgb8)
                    .map_err(failed)?;
            }
            EncodeFormat::Png => {
                PngEncoder::new(&mut buffer)
                    .write_image(
                        &raster.pixels,
                        raster.width,
                        raster.height,
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(failed)?;
            }
            EncodeFormat::Webp => {
                let pixels = quantize_for_webp(&raster.pixels, webp_levels(quality));
                WebPEncoder::new_lossless(&mut buffer)
                    .write_image(
                        &pixels,
                        raster.width,
                        raster.height,
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(failed)?;
            }
        }

        Ok(buffer.into_inner())
    }
}

fn validate(raster: &Raster, quality: f64) -> Result<(), EncodeError> {
    if raster.width == 0 || raster.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }

    let expected = (raster.width as usize) * (raster.height as usize) * 4;
    if raster.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: raster.pixels.len(),
        });
    }

    if !(quality > 0.0 && quality <= 1.0) {
        return Err(EncodeError::InvalidQuality(quality));
    }
    Ok(())
}

/// Colour levels per channel for a WebP encode at `quality`.
///
/// The WebP encoder is lossless, so quality is expressed by posterizing the
/// colour channels before encoding. The curve is quadratic so high
/// qualities keep fine gradients and low ones collapse quickly.
pub fn webp_levels(quality: f64) -> u16 {
    let q = jpeg_quality(quality);
    if q >= 100 {
        return 256;
    }
    let normalized = f64::from(q) / 100.0;
    (2.0 + normalized * normalized * 254.0).round().clamp(2.0, 256.0) as u16
}

/// Snap RGB channels onto `levels` evenly spaced values. Alpha is kept.
fn quantize_for_webp(rgba: &[u8], levels: u16) -> Cow<'_, [u8]> {
    if levels >= 256 {
        return Cow::Borrowed(rgba);
    }
    let step = 255.0 / (f64::from(levels) - 1.0);
    let mut out = rgba.to_vec();
    for px in out.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            let bucket = (f64::from(*c) / step).round();
            *c = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
    Cow::Owned(out)
}

/// Drop the alpha channel, compositing over black.
///
/// Transparent areas (the corners of a circle crop) come out black, as
/// they do when a canvas without alpha is exported.
fn flatten_onto_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u16;
        for &c in &px[..3] {
            rgb.push(((c as u16 * a + 127) / 255) as u8);
        }
    }
    rgb
}
