//! Scoped acquisition of global pointer input during a drag.
//!
//! While a handle is being dragged the host has to listen for pointer moves
//! and releases on the whole window, not just the crop box, or the gesture
//! is lost as soon as the pointer leaves it. Those listeners must be removed
//! again on every path out of the drag: pointer up, pointer cancel, the
//! session being reset, or the session being dropped outright.
//!
//! [`CropController`] ties that to the state machine: it holds a
//! [`CaptureGuard`] exactly while the wrapped [`CropState`] is dragging, and
//! the guard releases the capture when dropped.

use std::fmt;
use std::rc::Rc;

use super::crop::{update_crop, CropEvent, CropState};

/// Host-side global pointer listener registration.
pub trait PointerCapture {
    /// Start delivering window-level pointer events to the session.
    fn acquire(&self);
    /// Stop delivering them.
    fn release(&self);
}

/// Releases the capture when dropped.
pub struct CaptureGuard {
    capture: Rc<dyn PointerCapture>,
}

impl CaptureGuard {
    pub fn acquire(capture: Rc<dyn PointerCapture>) -> Self {
        capture.acquire();
        Self { capture }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.capture.release();
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard").finish_non_exhaustive()
    }
}

/// A crop session bound to a host pointer capture.
pub struct CropController {
    state: CropState,
    capture: Rc<dyn PointerCapture>,
    guard: Option<CaptureGuard>,
}

impl CropController {
    pub fn new(state: CropState, capture: Rc<dyn PointerCapture>) -> Self {
        let mut controller = Self {
            state,
            capture,
            guard: None,
        };
        controller.sync_capture();
        controller
    }

    pub fn state(&self) -> &CropState {
        &self.state
    }

    /// True while window-level listeners are held.
    pub fn is_capturing(&self) -> bool {
        self.guard.is_some()
    }

    /// Fold an event into the session and acquire or release the capture
    /// to match the resulting drag state.
    pub fn handle(&mut self, event: CropEvent) -> &CropState {
        self.state = update_crop(self.state, event);
        self.sync_capture();
        &self.state
    }

    /// End the session, releasing any capture still held.
    pub fn finish(self) -> CropState {
        self.state
    }

    fn sync_capture(&mut self) {
        match (self.state.is_dragging(), self.guard.is_some()) {
            (true, false) => self.guard = Some(CaptureGuard::acquire(Rc::clone(&self.capture))),
            (false, true) => self.guard = None,
            _ => {}
        }
    }
}

impl fmt::Debug for CropController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CropController")
            .field("state", &self.state)
            .field("capturing", &self.is_capturing())
            .finish()
    }
}
