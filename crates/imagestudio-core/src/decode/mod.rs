//! Image decoding and resampling for Image Studio.
//!
//! This module provides functionality for:
//! - Detecting the source format of dropped files (JPEG, PNG, WebP, GIF, BMP)
//! - Decoding to an RGBA raster with EXIF orientation applied
//! - Computing batch output dimensions from a width specification
//! - Resampling rasters
//!
//! # Architecture
//!
//! Decoding is driven from the browser via the WASM bindings. All operations
//! are synchronous and single-threaded within WASM.

mod load;
mod resize;
mod types;

pub use load::{decode_image, detect_format, DecodedSource};
pub use resize::{resize, resize_to_fit, resize_to_spec, target_dimensions, WidthSpec, WidthUnit};
pub use types::{DecodeError, FilterType, Orientation, Raster, SourceFormat};
