//! Crop session bindings.
//!
//! A `JsCropSession` is created by `JsStudio::begin_crop_session` with two
//! callbacks: one that attaches window-level pointer listeners and one that
//! detaches them. The session calls them as the drag starts and ends, and
//! detaches on drop if a drag is still in progress.
//!
//! # Usage
//!
//! ```typescript
//! const session = studio.begin_crop_session(id, 800, 600,
//!     () => window.addEventListener('pointermove', onMove),
//!     () => window.removeEventListener('pointermove', onMove));
//! box.onpointerdown = (e) => session.pointer_down(e.offsetX, e.offsetY);
//! session.handle({ type: 'setAspectRatio', ratio: { kind: 'fixed', ratio: 16 / 9 } });
//! ```

use std::rc::Rc;

use imagestudio_core::geometry::{CropController, CropEvent, CropState, PointerCapture};
use wasm_bindgen::prelude::*;

/// Pointer capture driven by JavaScript callbacks.
struct JsPointerCapture {
    acquire: js_sys::Function,
    release: js_sys::Function,
}

impl JsPointerCapture {
    fn call(f: &js_sys::Function) {
        if let Err(e) = f.call0(&JsValue::NULL) {
            web_sys::console::error_2(&JsValue::from_str("pointer capture callback failed:"), &e);
        }
    }
}

impl PointerCapture for JsPointerCapture {
    fn acquire(&self) {
        Self::call(&self.acquire);
    }

    fn release(&self) {
        Self::call(&self.release);
    }
}

/// An interactive crop session.
#[wasm_bindgen]
pub struct JsCropSession {
    controller: CropController,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Apply a crop event given as a plain object, e.g.
    /// `{ type: 'setField', field: 'w', value: 640 }`.
    pub fn handle(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event: CropEvent =
            serde_wasm_bindgen::from_value(event).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.controller.handle(event);
        Ok(())
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.controller.handle(CropEvent::PointerDown { x, y });
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.controller.handle(CropEvent::PointerMove { x, y });
    }

    pub fn pointer_up(&mut self) {
        self.controller.handle(CropEvent::PointerUp);
    }

    pub fn pointer_cancel(&mut self) {
        self.controller.handle(CropEvent::PointerCancel);
    }

    pub fn rotate_clockwise(&mut self) {
        self.controller.handle(CropEvent::RotateClockwise);
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.controller.handle(CropEvent::RotateCounterClockwise);
    }

    pub fn toggle_flip_h(&mut self) {
        self.controller.handle(CropEvent::ToggleFlipH);
    }

    pub fn toggle_flip_v(&mut self) {
        self.controller.handle(CropEvent::ToggleFlipV);
    }

    pub fn reset(&mut self) {
        self.controller.handle(CropEvent::Reset);
    }

    /// Crop rectangle in display space as `[x, y, w, h]`.
    pub fn display_rect(&self) -> Vec<f64> {
        let r = self.state().rect;
        vec![r.x, r.y, r.w, r.h]
    }

    /// Crop rectangle in natural pixels as `[x, y, w, h]`.
    pub fn natural_rect(&self) -> Vec<u32> {
        let r = self.state().natural_rect();
        vec![r.x, r.y, r.w, r.h]
    }

    #[wasm_bindgen(getter)]
    pub fn display_width(&self) -> f64 {
        self.state().display.w
    }

    #[wasm_bindgen(getter)]
    pub fn display_height(&self) -> f64 {
        self.state().display.h
    }

    /// Rotation in degrees (0, 90, 180 or 270).
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> u32 {
        self.state().rotation.degrees()
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.state().is_dragging()
    }

    #[wasm_bindgen(getter)]
    pub fn is_capturing(&self) -> bool {
        self.controller.is_capturing()
    }

    /// Full session state as a plain object.
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.state()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl JsCropSession {
    pub(crate) fn new(
        state: CropState,
        acquire: js_sys::Function,
        release: js_sys::Function,
    ) -> Self {
        Self::with_capture(state, Rc::new(JsPointerCapture { acquire, release }))
    }

    pub(crate) fn with_capture(state: CropState, capture: Rc<dyn PointerCapture>) -> Self {
        Self {
            controller: CropController::new(state, capture),
        }
    }

    pub(crate) fn state(&self) -> &CropState {
        self.controller.state()
    }
}
