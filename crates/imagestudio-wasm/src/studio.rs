//! Studio bindings: asset lifecycle, crop commit, batch processing and export.
//!
//! Settings are passed as plain JavaScript objects and read with
//! `serde-wasm-bindgen`; missing fields take their defaults.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const studio = new JsStudio();
//! const id = studio.load_asset(file.name, new Uint8Array(await file.arrayBuffer()));
//! const summary = studio.process_all({ width: 50, widthUnit: 'percent', targetSizeKb: 200 });
//! for (const file of studio.export_all()) {
//!     download(file.filename, new Blob([file.bytes()], { type: file.mime_type }));
//! }
//! ```

use imagestudio_core::geometry::Size;
use imagestudio_core::{AssetId, BatchReport, ProcessSettings, Studio, StudioError};
use wasm_bindgen::prelude::*;

use crate::crop::JsCropSession;
use crate::types::{BatchFailure, BatchSummary, JsEncodeResult, JsExportedFile, JsRaster};

fn to_js_error(e: StudioError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn read_settings(settings: JsValue) -> Result<ProcessSettings, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(ProcessSettings::default());
    }
    serde_wasm_bindgen::from_value(settings).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// The image studio engine.
#[wasm_bindgen]
pub struct JsStudio {
    inner: Studio,
}

#[wasm_bindgen]
impl JsStudio {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Studio::new(),
        }
    }

    /// Decode a dropped file and add it. Returns the new asset id.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a JPEG, PNG, WebP, GIF or BMP image.
    pub fn load_asset(&mut self, name: &str, bytes: Vec<u8>) -> Result<u32, JsValue> {
        self.inner
            .load_asset(name, bytes)
            .map(|id| id.0)
            .map_err(to_js_error)
    }

    /// Remove an asset and release its buffers.
    pub fn remove_asset(&mut self, id: u32) -> bool {
        self.inner.remove_asset(AssetId(id))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(getter)]
    pub fn asset_count(&self) -> usize {
        self.inner.len()
    }

    /// Asset ids in insertion order.
    pub fn asset_ids(&self) -> Vec<u32> {
        self.inner.assets().iter().map(|a| a.id.0).collect()
    }

    /// Status of an asset as `{ status, message? }`.
    pub fn asset_status(&self, id: u32) -> Result<JsValue, JsValue> {
        let asset = self
            .inner
            .asset(AssetId(id))
            .ok_or_else(|| to_js_error(StudioError::UnknownAsset(AssetId(id))))?;
        serde_wasm_bindgen::to_value(&asset.status).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Open a crop session sized to fit a `viewport_width` x `viewport_height` area.
    ///
    /// `acquire` is called when a drag starts and should attach window-level
    /// pointer listeners; `release` is called when it ends and should detach them.
    pub fn begin_crop_session(
        &self,
        id: u32,
        viewport_width: f64,
        viewport_height: f64,
        acquire: js_sys::Function,
        release: js_sys::Function,
    ) -> Result<JsCropSession, JsValue> {
        let state = self
            .inner
            .begin_crop_session(AssetId(id), Size::new(viewport_width, viewport_height))
            .map_err(to_js_error)?;
        Ok(JsCropSession::new(state, acquire, release))
    }

    /// Render the session at preview resolution (longest edge at most `max_edge`).
    pub fn preview(
        &self,
        id: u32,
        session: &JsCropSession,
        max_edge: u32,
    ) -> Result<JsRaster, JsValue> {
        self.preview_raster(AssetId(id), session, max_edge)
            .map(JsRaster::from_raster)
            .map_err(to_js_error)
    }

    /// Commit the session's crop and return the encoded result.
    pub fn apply_crop(
        &mut self,
        id: u32,
        session: &JsCropSession,
    ) -> Result<JsEncodeResult, JsValue> {
        self.commit_crop(AssetId(id), session)
            .map(JsEncodeResult::from_result)
            .map_err(to_js_error)
    }

    /// Queue the session's crop for the next `process_all`.
    pub fn set_pending_crop(&mut self, id: u32, session: &JsCropSession) -> Result<(), JsValue> {
        self.inner
            .set_pending_crop(AssetId(id), Some(*session.state()))
            .map_err(to_js_error)
    }

    pub fn clear_pending_crop(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner
            .set_pending_crop(AssetId(id), None)
            .map_err(to_js_error)
    }

    /// Encode one asset with the given settings object.
    pub fn encode(&mut self, id: u32, settings: JsValue) -> Result<JsEncodeResult, JsValue> {
        let settings = read_settings(settings)?;
        self.encode_with(AssetId(id), &settings)
            .map(JsEncodeResult::from_result)
            .map_err(to_js_error)
    }

    /// Process every asset. Returns `{ done: number[], failed: { id, message }[] }`.
    ///
    /// Per-asset failures are reported in the summary and on the console;
    /// they never abort the batch.
    pub fn process_all(&mut self, settings: JsValue) -> Result<JsValue, JsValue> {
        let settings = read_settings(settings)?;
        let summary = self.run_batch(&settings).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The asset's output as a downloadable file, if it has one.
    pub fn export_asset(&self, id: u32) -> Option<JsExportedFile> {
        self.inner
            .export_asset(AssetId(id))
            .map(JsExportedFile::from_file)
    }

    /// Every processed asset as a downloadable file, in insertion order.
    pub fn export_all(&self) -> Vec<JsExportedFile> {
        self.inner
            .export_all()
            .into_iter()
            .map(JsExportedFile::from_file)
            .collect()
    }
}

impl Default for JsStudio {
    fn default() -> Self {
        Self::new()
    }
}

impl JsStudio {
    pub(crate) fn preview_raster(
        &self,
        id: AssetId,
        session: &JsCropSession,
        max_edge: u32,
    ) -> Result<imagestudio_core::decode::Raster, StudioError> {
        let asset = self.inner.asset(id).ok_or(StudioError::UnknownAsset(id))?;
        Ok(imagestudio_core::compose_preview(
            asset.current(),
            session.state(),
            max_edge,
        )?)
    }

    pub(crate) fn commit_crop(
        &mut self,
        id: AssetId,
        session: &JsCropSession,
    ) -> Result<imagestudio_core::EncodeResult, StudioError> {
        Ok(self.inner.apply_crop(id, session.state())?.clone())
    }

    pub(crate) fn encode_with(
        &mut self,
        id: AssetId,
        settings: &ProcessSettings,
    ) -> Result<imagestudio_core::EncodeResult, StudioError> {
        let request = settings.to_request()?;
        Ok(self.inner.encode(id, &request)?.clone())
    }

    pub(crate) fn run_batch(
        &mut self,
        settings: &ProcessSettings,
    ) -> Result<BatchSummary, StudioError> {
        let report = self.inner.process_all(settings)?;
        for (id, message) in &report.failed {
            warn(&format!("Asset {} failed: {}", id, message));
        }
        Ok(summarize(report))
    }
}

fn summarize(report: BatchReport) -> BatchSummary {
    BatchSummary {
        done: report.done.into_iter().map(|id| id.0).collect(),
        failed: report
            .failed
            .into_iter()
            .map(|(id, message)| BatchFailure { id: id.0, message })
            .collect(),
    }
}
