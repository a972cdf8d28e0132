//! Image Studio Core - crop, transform and compression engine
//!
//! This crate provides the image processing behind Image Studio: decoding
//! dropped files, the interactive crop state machine, composing crops with
//! rotation and flips, resizing, and encoding under an optional byte budget.
//! It has no JavaScript types; the bindings live in `imagestudio-wasm`.

pub mod asset;
pub mod decode;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod settings;
pub mod studio;
pub mod transform;

pub use asset::{Asset, AssetId, AssetStatus};
pub use encode::{EncodeFormat, EncodeRequest, EncodeResult, TargetFormat};
pub use error::StudioError;
pub use geometry::{update_crop, AspectRatio, CropEvent, CropState, Rotation};
pub use settings::{ProcessSettings, SettingsError};
pub use studio::{BatchReport, ExportedFile, Studio};
pub use transform::{compose, compose_preview};
