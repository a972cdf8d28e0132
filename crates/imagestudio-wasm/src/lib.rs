//! Image Studio WASM - WebAssembly bindings for the Image Studio engine
//!
//! This crate exposes `imagestudio-core` to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `studio` - Asset lifecycle, crop commit, batch processing and export
//! - `crop` - Interactive crop sessions with pointer capture callbacks
//! - `types` - WASM-compatible wrappers for rasters, encode results and files
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsStudio } from '@imagestudio/wasm';
//!
//! await init();
//!
//! const studio = new JsStudio();
//! const id = studio.load_asset(file.name, new Uint8Array(await file.arrayBuffer()));
//! const result = studio.encode(id, { format: 'webp' });
//! console.log(`Encoded ${result.size_bytes} bytes`);
//! ```

use wasm_bindgen::prelude::*;

mod crop;
mod studio;
mod types;

pub use crop::JsCropSession;
pub use studio::JsStudio;
pub use types::{JsEncodeResult, JsExportedFile, JsRaster};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
