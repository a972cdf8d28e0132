//! Encoding pipeline for Image Studio.
//!
//! This module provides functionality for:
//! - Encoding rasters to JPEG, PNG or WebP
//! - Resolving the requested output format against the source format
//! - Searching for the highest quality that fits a byte budget
//!
//! # Architecture
//!
//! Everything above [`RasterEncoder`] is format-agnostic. The batch and the
//! single-asset paths both end in [`encode_raster`].

mod codec;
mod search;

pub use codec::{
    jpeg_quality, resolve_format, webp_levels, EncodeError, EncodeFormat, ImageCodec,
    RasterEncoder, TargetFormat,
};
pub use search::{
    encode_at, encode_raster, search_quality, EncodeRequest, EncodeResult, FALLBACK_QUALITY,
    SEARCH_ITERATIONS,
};
