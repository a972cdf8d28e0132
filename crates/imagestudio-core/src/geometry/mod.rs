//! Crop geometry for Image Studio.
//!
//! This module provides:
//! - Display/natural coordinate mapping
//! - The crop state machine driven by pointer and control events
//! - Scoped pointer capture for in-progress drags
//!
//! Everything here works on plain numbers; no pixels are touched until the
//! final [`CropState`] is handed to the compositor.

mod capture;
mod coords;
mod crop;

pub use capture::{CaptureGuard, CropController, PointerCapture};
pub use coords::{
    fit_display_size, point_to_display, point_to_natural, to_display, to_natural, PixelRect,
    Point, Rect, Scale, Size,
};
pub use crop::{
    clamp, enforce_aspect_ratio, matches_ratio, update_crop, Anchor, AspectRatio, CropEvent,
    CropField, CropState, DragMode, DragState, Handle, Rotation, ASPECT_PRESETS,
    HANDLE_HIT_RADIUS, HANDLES, MIN_SIZE,
};
