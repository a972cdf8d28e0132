//! Pixel transforms applied when a crop session is committed or previewed.
//!
//! # Transform Order
//!
//! 1. Extract the crop region (natural pixels)
//! 2. Flip horizontally, then vertically
//! 3. Rotate clockwise by the session rotation
//! 4. Circle mask, when the aspect ratio is `Circle`

mod compose;

pub use compose::{compose, compose_preview, rotated_dimensions, source_region};
