//! Crop composition: region extract, flip, quarter-turn rotation and circle mask.
//!
//! The output is built by inverse mapping. For each destination pixel we
//! undo the rotation, then the flips, and copy the source pixel that lands
//! there. That gives the same result as drawing the flipped region onto a
//! canvas rotated about its centre, without materialising the intermediate
//! flipped or rotated images.
//!
//! # Coordinate System
//!
//! - The crop rectangle is mapped from display space onto the raster that is
//!   actually passed in, so a down-scaled preview raster works unchanged
//! - Rotation is clockwise in 90° steps
//! - Flips are applied before rotation

use crate::decode::{resize_to_fit, DecodeError, FilterType, Raster};
use crate::geometry::{to_natural, CropState, PixelRect, Rotation, Size};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Output dimensions for a `width` x `height` region under `rotation`.
pub fn rotated_dimensions(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Source region of `source` selected by the session's crop rectangle.
pub fn source_region(source: &Raster, state: &CropState) -> PixelRect {
    let natural = Size::from_pixels(source.width, source.height);
    to_natural(state.rect, state.display, natural).clipped_to(source.width, source.height)
}

/// Compose a crop session onto a raster.
///
/// Both the live preview and the committed crop go through this function.
/// With a circle ratio the result is the centred `side x side` square of
/// the oriented region (`side` being the shorter edge) and every pixel
/// outside the inscribed circle is fully transparent.
pub fn compose(source: &Raster, state: &CropState) -> Raster {
    if source.is_empty() {
        return source.clone();
    }

    let region = source_region(source, state);
    let circle = state.aspect.is_circle();

    // Fast path: full frame, no orientation change
    if !circle
        && state.rotation == Rotation::Deg0
        && !state.flip_h
        && !state.flip_v
        && region == PixelRect::new(0, 0, source.width, source.height)
    {
        return source.clone();
    }

    let (oriented_w, oriented_h) = rotated_dimensions(region.w, region.h, state.rotation);
    let (out_w, out_h, off_x, off_y) = if circle {
        let side = oriented_w.min(oriented_h);
        (side, side, (oriented_w - side) / 2, (oriented_h - side) / 2)
    } else {
        (oriented_w, oriented_h, 0, 0)
    };

    let radius = out_w as f64 / 2.0;
    let mut output = Vec::with_capacity((out_w as usize) * (out_h as usize) * 4);

    for y in 0..out_h {
        for x in 0..out_w {
            if circle && outside_circle(x, y, radius) {
                output.extend_from_slice(&TRANSPARENT);
                continue;
            }

            let (rx, ry) = unrotate(x + off_x, y + off_y, region.w, region.h, state.rotation);
            let sx = if state.flip_h { region.w - 1 - rx } else { rx };
            let sy = if state.flip_v { region.h - 1 - ry } else { ry };

            let idx = (((region.y + sy) as usize) * (source.width as usize)
                + (region.x + sx) as usize)
                * 4;
            output.extend_from_slice(&source.pixels[idx..idx + 4]);
        }
    }

    Raster::new(out_w, out_h, output)
}

/// Compose from a copy of `source` scaled down to at most `max_edge`.
///
/// Produces the same framing as [`compose`] at preview resolution.
pub fn compose_preview(
    source: &Raster,
    state: &CropState,
    max_edge: u32,
) -> Result<Raster, DecodeError> {
    let small = resize_to_fit(source, max_edge, FilterType::Bilinear)?;
    Ok(compose(&small, state))
}

/// Map an oriented-space pixel back into the unrotated `w` x `h` region.
fn unrotate(x: u32, y: u32, w: u32, h: u32, rotation: Rotation) -> (u32, u32) {
    match rotation {
        Rotation::Deg0 => (x, y),
        Rotation::Deg90 => (y, h - 1 - x),
        Rotation::Deg180 => (w - 1 - x, h - 1 - y),
        Rotation::Deg270 => (w - 1 - y, x),
    }
}

/// Pixel-centre test against the circle inscribed in a square of side `2 * radius`.
fn outside_circle(x: u32, y: u32, radius: f64) -> bool {
    let dx = x as f64 + 0.5 - radius;
    let dy = y as f64 + 0.5 - radius;
    dx * dx + dy * dy > radius * radius
}
