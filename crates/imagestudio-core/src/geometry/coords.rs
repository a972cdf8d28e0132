//! Conversion between natural and display pixel space.
//!
//! Natural space is the source raster's true pixel grid. Display space is
//! the (usually smaller) on-screen rendering the user drags handles over.
//! Scale factors are applied independently per axis; when the display size
//! was produced by [`fit_display_size`] they are equal up to flooring.
//!
//! Natural-space results are always rounded to whole pixels. Display-space
//! results keep their fractional part so dragging stays smooth.

use serde::{Deserialize, Serialize};

/// A width/height pair in either space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn from_pixels(w: u32, h: u32) -> Self {
        Self {
            w: w as f64,
            h: h as f64,
        }
    }

    /// True if either axis is zero, negative or not a number.
    pub fn is_degenerate(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }
}

/// A pointer position in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in display space. Sub-pixel values are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin covering `size`.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.w, size.h)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// A rectangle in natural space, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Restrict the rectangle to a `width` x `height` raster.
    ///
    /// Rounding in the mapper can push the far edge one pixel past the
    /// raster; this trims it back. Width and height stay at least 1.
    pub fn clipped_to(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width.saturating_sub(1));
        let y = self.y.min(height.saturating_sub(1));
        let w = self.w.min(width - x).max(1);
        let h = self.h.min(height - y).max(1);
        Self { x, y, w, h }
    }
}

/// Per-axis factors taking display coordinates to natural coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    /// `natural / display` on each axis. A degenerate display maps 1:1.
    pub fn between(display: Size, natural: Size) -> Self {
        if display.is_degenerate() {
            return Self { x: 1.0, y: 1.0 };
        }
        Self {
            x: natural.w / display.w,
            y: natural.h / display.h,
        }
    }
}

fn round_px(v: f64) -> u32 {
    if v <= 0.0 || v.is_nan() {
        0
    } else {
        v.round() as u32
    }
}

/// Map a display-space point to natural space.
pub fn point_to_natural(p: Point, display: Size, natural: Size) -> (u32, u32) {
    let s = Scale::between(display, natural);
    (round_px(p.x * s.x), round_px(p.y * s.y))
}

/// Map a natural-space point to display space.
pub fn point_to_display(x: u32, y: u32, display: Size, natural: Size) -> Point {
    let s = Scale::between(display, natural);
    Point::new(x as f64 / s.x, y as f64 / s.y)
}

/// Map a display-space rectangle to natural space.
pub fn to_natural(rect: Rect, display: Size, natural: Size) -> PixelRect {
    let s = Scale::between(display, natural);
    PixelRect {
        x: round_px(rect.x * s.x),
        y: round_px(rect.y * s.y),
        w: round_px(rect.w * s.x),
        h: round_px(rect.h * s.y),
    }
}

/// Map a natural-space rectangle to display space.
pub fn to_display(rect: PixelRect, display: Size, natural: Size) -> Rect {
    let s = Scale::between(display, natural);
    Rect {
        x: rect.x as f64 / s.x,
        y: rect.y as f64 / s.y,
        w: rect.w as f64 / s.x,
        h: rect.h as f64 / s.y,
    }
}

/// Display size for a `natural` image shown inside `viewport`.
///
/// The image is scaled down uniformly to fit, never up, and each axis is
/// floored to a whole pixel (at least 1).
pub fn fit_display_size(natural: Size, viewport: Size) -> Size {
    if natural.is_degenerate() {
        return Size::default();
    }
    let scale = if viewport.is_degenerate() {
        1.0
    } else {
        (viewport.w / natural.w).min(viewport.h / natural.h).min(1.0)
    };
    Size {
        w: (natural.w * scale).floor().max(1.0),
        h: (natural.h * scale).floor().max(1.0),
    }
}
