//! Batch-wide processing settings.
//!
//! These arrive from the host as a plain object, so every field has a
//! default and both `camelCase` and `snake_case` spellings are accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{WidthSpec, WidthUnit};
use crate::encode::{EncodeRequest, TargetFormat};

/// Bytes per KB in the target-size field.
pub const BYTES_PER_KB: f64 = 1024.0;

/// Errors for settings that cannot produce a valid encode request.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Width must be a positive number, got {0}")]
    InvalidWidth(f64),

    #[error("Quality must be in (0, 1], got {0}")]
    InvalidQuality(f64),

    #[error("Target size must be zero or a positive number of KB, got {0}")]
    InvalidTargetSize(f64),
}

/// Settings applied to every asset in a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessSettings {
    /// Output width, interpreted according to `width_unit`.
    pub width: f64,
    #[serde(alias = "width_unit")]
    pub width_unit: WidthUnit,
    pub format: TargetFormat,
    /// Encoder quality in (0, 1].
    pub quality: f64,
    /// Byte ceiling in KB. Zero disables the size search.
    #[serde(alias = "target_size_kb")]
    pub target_size_kb: f64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            width: 100.0,
            width_unit: WidthUnit::Percent,
            format: TargetFormat::Original,
            quality: 0.8,
            target_size_kb: 0.0,
        }
    }
}

impl ProcessSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(SettingsError::InvalidWidth(self.width));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(SettingsError::InvalidQuality(self.quality));
        }
        if !self.target_size_kb.is_finite() || self.target_size_kb < 0.0 {
            return Err(SettingsError::InvalidTargetSize(self.target_size_kb));
        }
        Ok(())
    }

    pub fn width_spec(&self) -> WidthSpec {
        WidthSpec {
            value: self.width,
            unit: self.width_unit,
        }
    }

    /// Byte ceiling derived from `target_size_kb`, if one is set.
    pub fn target_size_bytes(&self) -> Option<u64> {
        if self.target_size_kb > 0.0 {
            Some((self.target_size_kb * BYTES_PER_KB).round() as u64)
        } else {
            None
        }
    }

    /// Validate and convert into an [`EncodeRequest`].
    pub fn to_request(&self) -> Result<EncodeRequest, SettingsError> {
        self.validate()?;
        Ok(EncodeRequest {
            width_spec: self.width_spec(),
            format: self.format,
            quality: self.quality,
            target_size_bytes: self.target_size_bytes(),
        })
    }
}
