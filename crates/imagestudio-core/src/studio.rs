//! The batch orchestrator.
//!
//! A [`Studio`] owns an ordered collection of assets and runs the crop,
//! resize and encode stages over them. Assets are processed one after the
//! other in insertion order, and a failure in one never stops the rest.

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::{debug, warn};

use crate::asset::{Asset, AssetId, AssetStatus};
use crate::decode::{decode_image, resize_to_spec, FilterType, Raster, SourceFormat};
use crate::encode::{
    encode_at, encode_raster, EncodeFormat, EncodeRequest, EncodeResult, ImageCodec,
    RasterEncoder,
};
use crate::error::StudioError;
use crate::geometry::{fit_display_size, CropState, Size};
use crate::settings::ProcessSettings;
use crate::transform::compose;

/// Quality used when a committed crop is encoded.
pub const CROP_OUTPUT_QUALITY: f64 = 0.92;

/// A file ready to be handed to the host's download primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Outcome of one [`Studio::process_all`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub done: Vec<AssetId>,
    pub failed: Vec<(AssetId, String)>,
}

/// Orchestrates assets through crop, resize and encode.
#[derive(Debug)]
pub struct Studio<E = ImageCodec> {
    assets: Vec<Asset>,
    next_id: u32,
    encoder: E,
}

impl Studio {
    pub fn new() -> Self {
        Self::with_encoder(ImageCodec)
    }
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RasterEncoder> Studio<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self {
            assets: Vec::new(),
            next_id: 1,
            encoder,
        }
    }

    /// Decode `bytes` and append a new asset.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Decode` if the bytes are not a supported image.
    /// Nothing is added in that case.
    pub fn load_asset(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<AssetId, StudioError> {
        let name = name.into();
        let decoded =
            decode_image(&bytes).inspect_err(|e| warn!("Failed to load {}: {}", name, e))?;

        let id = AssetId(self.next_id);
        self.next_id += 1;
        debug!(
            "Loaded {} as asset {} ({}x{} {:?})",
            name, id, decoded.raster.width, decoded.raster.height, decoded.format
        );

        self.assets
            .push(Asset::new(id, name, bytes, decoded.format, decoded.raster));
        Ok(id)
    }

    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Assets in insertion order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Remove an asset and drop all of its buffers.
    pub fn remove_asset(&mut self, id: AssetId) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        self.assets.len() != before
    }

    /// Remove every asset.
    pub fn clear(&mut self) {
        self.assets.clear();
    }

    /// Open a crop session over the asset's current raster, sized to fit
    /// `viewport`. The session starts with the full image selected.
    pub fn begin_crop_session(
        &self,
        id: AssetId,
        viewport: Size,
    ) -> Result<CropState, StudioError> {
        let asset = self.asset(id).ok_or(StudioError::UnknownAsset(id))?;
        let raster = asset.current();
        let natural = Size::from_pixels(raster.width, raster.height);
        Ok(CropState::new(fit_display_size(natural, viewport), natural))
    }

    /// Commit a crop session and return the recorded output.
    ///
    /// The composed raster replaces the working raster and is encoded right
    /// away: circle crops as PNG, everything else in the source format (PNG
    /// sources as JPEG) at [`CROP_OUTPUT_QUALITY`]. If encoding fails the
    /// working raster is kept, the asset is marked `Error` and its output
    /// is dropped.
    pub fn apply_crop(
        &mut self,
        id: AssetId,
        state: &CropState,
    ) -> Result<&EncodeResult, StudioError> {
        let index = self.index_of(id)?;
        let asset = &self.assets[index];

        let composed = compose(asset.current(), state);
        let format = crop_output_format(asset.source_format, state);
        let output = match encode_at(&self.encoder, &composed, format, CROP_OUTPUT_QUALITY) {
            Ok(output) => output,
            Err(e) => return Err(record_failure(&mut self.assets[index], e.into())),
        };
        debug!(
            "Applied crop to asset {}: {}x{} {:?}",
            id, composed.width, composed.height, format
        );

        let asset = &mut self.assets[index];
        asset.working = Some(composed);
        asset.pending_crop = None;
        asset.status = AssetStatus::Done;
        Ok(&*asset.output.insert(output))
    }

    /// Queue a crop to be composed during the next batch run, or clear it.
    pub fn set_pending_crop(
        &mut self,
        id: AssetId,
        crop: Option<CropState>,
    ) -> Result<(), StudioError> {
        let index = self.index_of(id)?;
        self.assets[index].pending_crop = crop;
        Ok(())
    }

    /// Run one asset through the pipeline and store the result as its output.
    ///
    /// On failure the asset is marked `Error` and its previous output is
    /// dropped, so a stale file is never exported.
    pub fn encode(
        &mut self,
        id: AssetId,
        request: &EncodeRequest,
    ) -> Result<&EncodeResult, StudioError> {
        let index = self.index_of(id)?;
        let asset = &mut self.assets[index];

        match run_pipeline(&self.encoder, asset, request) {
            Ok(result) => {
                asset.status = AssetStatus::Done;
                Ok(&*asset.output.insert(result))
            }
            Err(e) => Err(record_failure(asset, e)),
        }
    }

    /// Process every asset with the same settings.
    ///
    /// Settings are validated once up front. After that each asset ends up
    /// either `Done` with a fresh output or `Error` with no output; one
    /// asset failing does not affect the others.
    pub fn process_all(
        &mut self,
        settings: &ProcessSettings,
    ) -> Result<BatchReport, StudioError> {
        let request = settings.to_request()?;
        let mut report = BatchReport::default();

        for asset in &mut self.assets {
            asset.status = AssetStatus::Processing;

            match run_pipeline(&self.encoder, asset, &request) {
                Ok(result) => {
                    debug!(
                        "Asset {} done: {} bytes {:?} at quality {:.3}",
                        asset.id, result.size_bytes, result.format, result.quality
                    );
                    asset.output = Some(result);
                    asset.status = AssetStatus::Done;
                    report.done.push(asset.id);
                }
                Err(e) => {
                    let message = e.to_string();
                    record_failure(asset, e);
                    report.failed.push((asset.id, message));
                }
            }
        }

        Ok(report)
    }

    /// The asset's current output under its derived file name.
    pub fn export_asset(&self, id: AssetId) -> Option<ExportedFile> {
        let asset = self.asset(id)?;
        let output = asset.output.as_ref()?;
        Some(ExportedFile {
            filename: format!("{}.{}", asset.base_name(), output.format.extension()),
            mime_type: output.format.mime_type(),
            bytes: output.bytes.clone(),
        })
    }

    /// Every asset with an output, in insertion order.
    ///
    /// Repeated file names get a `-N` suffix so no export overwrites another.
    pub fn export_all(&self) -> Vec<ExportedFile> {
        let mut used = HashSet::new();
        let mut files = Vec::new();

        for asset in &self.assets {
            if asset.status.is_error() {
                continue;
            }
            let Some(output) = asset.output.as_ref() else {
                continue;
            };

            let base = asset.base_name();
            let ext = output.format.extension();
            let mut filename = format!("{base}.{ext}");
            let mut n = 1;
            while used.contains(&filename) {
                filename = format!("{base}-{n}.{ext}");
                n += 1;
            }
            used.insert(filename.clone());

            files.push(ExportedFile {
                filename,
                mime_type: output.format.mime_type(),
                bytes: output.bytes.clone(),
            });
        }

        files
    }

    fn index_of(&self, id: AssetId) -> Result<usize, StudioError> {
        self.assets
            .iter()
            .position(|a| a.id == id)
            .ok_or(StudioError::UnknownAsset(id))
    }
}

/// Mark `asset` as failed with `error` and drop its output.
fn record_failure(asset: &mut Asset, error: StudioError) -> StudioError {
    let message = error.to_string();
    warn!("Asset {} ({}) failed: {}", asset.id, asset.name, message);
    asset.output = None;
    asset.status = AssetStatus::Error(message);
    error
}

/// Output format of a committed crop.
fn crop_output_format(source: SourceFormat, state: &CropState) -> EncodeFormat {
    if state.aspect.is_circle() {
        return EncodeFormat::Png;
    }
    match source {
        SourceFormat::Webp => EncodeFormat::Webp,
        _ => EncodeFormat::Jpeg,
    }
}

/// Pending crop, then resize, then encode.
fn run_pipeline<E: RasterEncoder + ?Sized>(
    encoder: &E,
    asset: &Asset,
    request: &EncodeRequest,
) -> Result<EncodeResult, StudioError> {
    let mut raster: Cow<'_, Raster> = Cow::Borrowed(asset.current());

    if let Some(crop) = &asset.pending_crop {
        raster = Cow::Owned(compose(&raster, crop));
    }

    if !request.width_spec.is_identity() {
        raster = Cow::Owned(resize_to_spec(&raster, request.width_spec, FilterType::Bilinear)?);
    }

    Ok(encode_raster(encoder, &raster, asset.source_format, request)?)
}
