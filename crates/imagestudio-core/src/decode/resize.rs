//! Output size calculation and resampling.
//!
//! The batch resize stage only ever takes a width: either a percentage
//! applied to both axes or an absolute pixel width with the height scaled by
//! the same factor. There is no independent height control, so the aspect
//! ratio of the (already cropped) raster is always preserved.

use serde::{Deserialize, Serialize};

use super::{DecodeError, FilterType, Raster};

/// Unit of a [`WidthSpec`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthUnit {
    /// Percentage of the current width (100 = unchanged).
    #[default]
    Percent,
    /// Absolute output width in pixels.
    Pixel,
}

/// Requested output width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthSpec {
    pub value: f64,
    pub unit: WidthUnit,
}

impl WidthSpec {
    pub fn percent(value: f64) -> Self {
        Self {
            value,
            unit: WidthUnit::Percent,
        }
    }

    pub fn pixels(value: f64) -> Self {
        Self {
            value,
            unit: WidthUnit::Pixel,
        }
    }

    /// True when this width leaves the dimensions untouched for any input.
    pub fn is_identity(&self) -> bool {
        self.unit == WidthUnit::Percent && (self.value - 100.0).abs() < f64::EPSILON
    }
}

impl Default for WidthSpec {
    fn default() -> Self {
        Self::percent(100.0)
    }
}

/// Compute output dimensions for a raster of `width` x `height`.
///
/// Both axes are scaled by the same factor and rounded to the nearest
/// pixel, never below 1. Zero-sized input or a non-positive width yields
/// `(0, 0)`, which the resampler rejects.
pub fn target_dimensions(width: u32, height: u32, spec: WidthSpec) -> (u32, u32) {
    if width == 0 || height == 0 || !spec.value.is_finite() || spec.value <= 0.0 {
        return (0, 0);
    }

    let scale = match spec.unit {
        WidthUnit::Percent => spec.value / 100.0,
        WidthUnit::Pixel => spec.value / width as f64,
    };

    let new_width = match spec.unit {
        WidthUnit::Percent => (width as f64 * scale).round(),
        WidthUnit::Pixel => spec.value.round(),
    };
    let new_height = (height as f64 * scale).round();

    ((new_width as u32).max(1), (new_height as u32).max(1))
}

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for a zero target dimension and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// declared dimensions.
pub fn resize(
    image: &Raster,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Raster, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbaImage".to_string()))?;

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());
    Ok(Raster::from_rgba_image(resized))
}

/// Apply a [`WidthSpec`] to a raster.
pub fn resize_to_spec(
    image: &Raster,
    spec: WidthSpec,
    filter: FilterType,
) -> Result<Raster, DecodeError> {
    let (width, height) = target_dimensions(image.width, image.height, spec);
    resize(image, width, height, filter)
}

/// Resize an image to fit within a maximum edge length while preserving aspect ratio.
///
/// Images already inside the bound are returned unchanged. Used to build
/// the small raster the live crop preview is drawn from.
pub fn resize_to_fit(
    image: &Raster,
    max_edge: u32,
    filter: FilterType,
) -> Result<Raster, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let longest = image.width.max(image.height);
    let spec = WidthSpec::percent(max_edge as f64 * 100.0 / longest as f64);
    let (mut width, mut height) = target_dimensions(image.width, image.height, spec);
    // Rounding may land one pixel over on the long edge
    width = width.min(max_edge);
    height = height.min(max_edge);

    resize(image, width, height, filter)
}
