//! Engine-level error type.

use thiserror::Error;

use crate::asset::AssetId;
use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::settings::SettingsError;

/// Errors returned by [`Studio`](crate::Studio) operations.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("No asset with id {0}")]
    UnknownAsset(AssetId),
}
