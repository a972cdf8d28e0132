//! WASM-compatible wrapper types.
//!
//! These wrap core values so JavaScript can read them through getters. Byte
//! and pixel buffers are copied out to JavaScript on access.

use imagestudio_core::decode::Raster;
use imagestudio_core::{EncodeResult, ExportedFile};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// An RGBA raster, e.g. a crop preview ready for `ImageData`.
#[wasm_bindgen]
pub struct JsRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRaster {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsRaster {
    pub(crate) fn from_raster(raster: Raster) -> Self {
        Self {
            width: raster.width,
            height: raster.height,
            pixels: raster.pixels,
        }
    }
}

/// Encoded output of one asset.
#[wasm_bindgen]
pub struct JsEncodeResult {
    inner: EncodeResult,
}

#[wasm_bindgen]
impl JsEncodeResult {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Quality the bytes were produced at, in (0, 1].
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> f64 {
        self.inner.quality
    }

    /// Encoded size in bytes.
    #[wasm_bindgen(getter)]
    pub fn size_bytes(&self) -> f64 {
        self.inner.size_bytes as f64
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.format.mime_type().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn extension(&self) -> String {
        self.inner.format.extension().to_string()
    }

    /// Encoded bytes as Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }
}

impl JsEncodeResult {
    pub(crate) fn from_result(inner: EncodeResult) -> Self {
        Self { inner }
    }
}

/// A file to download.
#[wasm_bindgen]
pub struct JsExportedFile {
    inner: ExportedFile,
}

#[wasm_bindgen]
impl JsExportedFile {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.inner.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type.to_string()
    }

    /// File contents as Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }
}

impl JsExportedFile {
    pub(crate) fn from_file(inner: ExportedFile) -> Self {
        Self { inner }
    }
}

/// Plain-object summary of a batch run.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct BatchSummary {
    pub done: Vec<u32>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct BatchFailure {
    pub id: u32,
    pub message: String,
}
