//! Assets: one loaded image and everything derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decode::{Raster, SourceFormat};
use crate::encode::EncodeResult;
use crate::geometry::CropState;

/// Stable asset handle. Never reused within one [`Studio`](crate::Studio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing status shown next to each asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Pending,
    Processing,
    Done,
    Error(String),
}

impl AssetStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, AssetStatus::Error(_))
    }
}

/// A loaded image.
///
/// The source raster is kept untouched. Crops replace `working` wholesale,
/// and every encode replaces `output` wholesale.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Original encoded bytes as loaded.
    pub source_bytes: Vec<u8>,
    pub source_format: SourceFormat,
    /// Decoded, oriented source pixels.
    pub source: Raster,
    /// Result of the last committed crop.
    pub working: Option<Raster>,
    /// Crop queued for the next batch run.
    pub pending_crop: Option<CropState>,
    pub status: AssetStatus,
    pub output: Option<EncodeResult>,
}

impl Asset {
    pub(crate) fn new(
        id: AssetId,
        name: String,
        bytes: Vec<u8>,
        format: SourceFormat,
        source: Raster,
    ) -> Self {
        Self {
            id,
            name,
            source_bytes: bytes,
            source_format: format,
            source,
            working: None,
            pending_crop: None,
            status: AssetStatus::Pending,
            output: None,
        }
    }

    /// Natural dimensions of the decoded source.
    pub fn natural_size(&self) -> (u32, u32) {
        (self.source.width, self.source.height)
    }

    /// The raster later stages start from: the working copy if one exists.
    pub fn current(&self) -> &Raster {
        self.working.as_ref().unwrap_or(&self.source)
    }

    /// File name without its last extension.
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}
