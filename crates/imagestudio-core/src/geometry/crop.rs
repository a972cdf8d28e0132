//! Interactive crop rectangle: handle dragging, aspect ratios and clamping.
//!
//! The crop rectangle lives in display space. Every event is folded into a
//! new [`CropState`] by [`update_crop`], a pure function, and every path
//! that changes the rectangle finishes with [`clamp`], so the bounds
//! invariant holds by construction rather than being checked afterwards:
//!
//! ```text
//! 0 <= x,  0 <= y,  x + w <= display.w,  y + h <= display.h,  w, h >= MIN_SIZE
//! ```
//!
//! # Drag state machine
//!
//! ```text
//!            pointer down on handle      ┌──────────────────────┐
//!         ┌─────────────────────────────▶│ Dragging(Handle(x,y))│
//!         │  pointer down in crop box    ├──────────────────────┤
//!  Idle ──┼─────────────────────────────▶│ Dragging(Move)       │──┐
//!         │  pointer down in image       ├──────────────────────┤  │ pointer up /
//!         └─────────────────────────────▶│ Dragging(CreateNew)  │  │ pointer cancel
//!                                        └──────────────────────┘  │
//!    ▲─────────────────────────────────────────────────────────────┘
//! ```
//!
//! While dragging, each pointer move recomputes the rectangle from the
//! anchor rectangle and pointer recorded at pointer-down, so rounding never
//! accumulates across frames.

use serde::{Deserialize, Serialize};

use super::coords::{to_natural, PixelRect, Point, Rect, Scale, Size};

/// Smallest crop edge, in display pixels.
pub const MIN_SIZE: f64 = 20.0;

/// Distance from a control point within which a pointer-down grabs it.
pub const HANDLE_HIT_RADIUS: f64 = 6.0;

/// Aspect-ratio constraint of a crop session.
///
/// `Circle` behaves like a 1:1 ratio for geometry but is kept distinct from
/// `Fixed(1.0)`: only a circle crop is masked to an ellipse on output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ratio", rename_all = "lowercase")]
pub enum AspectRatio {
    #[default]
    Free,
    /// Width divided by height. Non-positive or non-finite values act as `Free`.
    Fixed(f64),
    Circle,
}

impl AspectRatio {
    /// The numeric ratio to enforce, if any.
    pub fn effective(self) -> Option<f64> {
        match self {
            AspectRatio::Free => None,
            AspectRatio::Fixed(r) if r.is_finite() && r > 0.0 => Some(r),
            AspectRatio::Fixed(_) => None,
            AspectRatio::Circle => Some(1.0),
        }
    }

    pub fn is_circle(self) -> bool {
        matches!(self, AspectRatio::Circle)
    }
}

/// The ratio buttons offered by the crop dialog, in display order.
pub const ASPECT_PRESETS: [(&str, AspectRatio); 8] = [
    ("Free", AspectRatio::Free),
    ("1:1", AspectRatio::Fixed(1.0)),
    ("4:3", AspectRatio::Fixed(4.0 / 3.0)),
    ("16:9", AspectRatio::Fixed(16.0 / 9.0)),
    ("3:2", AspectRatio::Fixed(3.0 / 2.0)),
    ("9:16", AspectRatio::Fixed(9.0 / 16.0)),
    ("2:1", AspectRatio::Fixed(2.0)),
    ("Circle", AspectRatio::Circle),
];

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a multiple of 90 degrees. Negative and > 360 values wrap.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            _ => Some(Rotation::Deg270),
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg270,
            Rotation::Deg90 => Rotation::Deg0,
            Rotation::Deg180 => Rotation::Deg90,
            Rotation::Deg270 => Rotation::Deg180,
        }
    }

    /// Quarter and three-quarter turns swap width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// One of the 8 control points. `hx`/`hy` are -1, 0 or 1 and name the
/// edge being dragged on each axis (0 = that axis is untouched).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub hx: i8,
    pub hy: i8,
}

impl Handle {
    pub const fn new(hx: i8, hy: i8) -> Self {
        Self { hx, hy }
    }

    pub fn is_corner(self) -> bool {
        self.hx != 0 && self.hy != 0
    }

    /// Position of the control point on `rect`.
    pub fn position(self, rect: &Rect) -> Point {
        let along = |h: i8, start: f64, len: f64| start + len * (h as f64 + 1.0) / 2.0;
        Point::new(along(self.hx, rect.x, rect.w), along(self.hy, rect.y, rect.h))
    }
}

/// The control points, clockwise from top-left.
pub const HANDLES: [Handle; 8] = [
    Handle::new(-1, -1),
    Handle::new(0, -1),
    Handle::new(1, -1),
    Handle::new(1, 0),
    Handle::new(1, 1),
    Handle::new(0, 1),
    Handle::new(-1, 1),
    Handle::new(-1, 0),
];

/// What a drag gesture is doing to the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragMode {
    Move,
    CreateNew,
    Handle(Handle),
}

/// Pointer tracking state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        mode: DragMode,
        /// Rectangle at pointer-down.
        start_rect: Rect,
        /// Pointer position at pointer-down.
        start_pointer: Point,
    },
}

/// Which dimension is authoritative when a ratio is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Width,
    Height,
}

/// A precision input field. Values are entered in natural pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropField {
    X,
    Y,
    W,
    H,
}

/// Everything that can happen during a crop session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CropEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    /// The pointer left the window or the gesture was interrupted.
    PointerCancel,
    SetAspectRatio { ratio: AspectRatio },
    SetField { field: CropField, value: f64 },
    RotateClockwise,
    RotateCounterClockwise,
    ToggleFlipH,
    ToggleFlipV,
    Reset,
}

/// State of one crop session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropState {
    /// Size of the on-screen image the rectangle is expressed against.
    pub display: Size,
    /// True dimensions of the raster being cropped.
    pub natural: Size,
    /// Crop rectangle in display space.
    pub rect: Rect,
    pub aspect: AspectRatio,
    pub rotation: Rotation,
    pub flip_h: bool,
    pub flip_v: bool,
    pub drag: DragState,
}

impl CropState {
    /// Full-image rectangle, free ratio, no rotation or flips.
    pub fn new(display: Size, natural: Size) -> Self {
        Self {
            display,
            natural,
            rect: Rect::from_size(display),
            aspect: AspectRatio::Free,
            rotation: Rotation::Deg0,
            flip_h: false,
            flip_v: false,
            drag: DragState::Idle,
        }
    }

    /// The crop rectangle in natural pixels.
    ///
    /// Always derived from the display rectangle, never stored, so the two
    /// representations cannot drift apart.
    pub fn natural_rect(&self) -> PixelRect {
        to_natural(self.rect, self.display, self.natural)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// True when the session leaves the image untouched.
    pub fn is_identity(&self) -> bool {
        let nat = self.natural_rect();
        !self.aspect.is_circle()
            && self.rotation == Rotation::Deg0
            && !self.flip_h
            && !self.flip_v
            && nat.x == 0
            && nat.y == 0
            && nat.w as f64 == self.natural.w
            && nat.h as f64 == self.natural.h
    }

    /// Classify a pointer-down position. Handles win over the box interior;
    /// positions outside the image start nothing.
    pub fn hit_test(&self, p: Point) -> Option<DragMode> {
        let grabbed = HANDLES.iter().copied().find(|h| {
            let c = h.position(&self.rect);
            (p.x - c.x).abs() <= HANDLE_HIT_RADIUS && (p.y - c.y).abs() <= HANDLE_HIT_RADIUS
        });
        if let Some(handle) = grabbed {
            return Some(DragMode::Handle(handle));
        }
        if self.rect.contains(p) {
            return Some(DragMode::Move);
        }
        if Rect::from_size(self.display).contains(p) {
            return Some(DragMode::CreateNew);
        }
        None
    }
}

/// Keep `rect` inside `display` with both edges at least [`MIN_SIZE`].
///
/// A part hanging off the left or top is trimmed first so the opposite edge
/// stays put. Then size is limited before position, which keeps the
/// invariant at the image edges.
pub fn clamp(rect: Rect, display: Size) -> Rect {
    let Rect {
        mut x,
        mut y,
        mut w,
        mut h,
    } = rect;

    if x < 0.0 {
        w += x;
        x = 0.0;
    }
    if y < 0.0 {
        h += y;
        y = 0.0;
    }

    w = MIN_SIZE.max(w.min(display.w - x));
    h = MIN_SIZE.max(h.min(display.h - y));
    x = 0.0_f64.max(x.min(display.w - w));
    y = 0.0_f64.max(y.min(display.h - h));

    Rect { x, y, w, h }
}

/// Recompute one dimension from the other so `w / h` equals the ratio.
///
/// `Free` (or an invalid fixed ratio) returns the rectangle unchanged.
pub fn enforce_aspect_ratio(rect: Rect, aspect: AspectRatio, anchor: Anchor) -> Rect {
    let Some(r) = aspect.effective() else {
        return rect;
    };
    match anchor {
        Anchor::Height => Rect {
            w: (rect.h * r).round(),
            ..rect
        },
        Anchor::Width => Rect {
            h: (rect.w / r).round(),
            ..rect
        },
    }
}

/// True if `rect` satisfies ratio `r` within a pixel of rounding.
pub fn matches_ratio(rect: &Rect, r: f64) -> bool {
    (rect.w - (rect.h * r).round()).abs() <= 1.0 || (rect.h - (rect.w / r).round()).abs() <= 1.0
}

/// Clamp, then restore an active ratio that clamping broke by shrinking the
/// dimension that no longer fits. Rectangles that did not satisfy the ratio
/// before clamping (edge-handle drags) are only clamped.
fn constrain(rect: Rect, aspect: AspectRatio, display: Size) -> Rect {
    constrain_pinned(rect, aspect, display, None)
}

/// [`constrain`] for a handle drag: when the ratio is restored, the edges
/// opposite a dragged left or top edge stay where they were in `start`.
fn constrain_pinned(
    rect: Rect,
    aspect: AspectRatio,
    display: Size,
    pinned: Option<(Handle, Rect)>,
) -> Rect {
    let clamped = clamp(rect, display);
    let Some(r) = aspect.effective() else {
        return clamped;
    };
    if !matches_ratio(&rect, r) || matches_ratio(&clamped, r) {
        return clamped;
    }

    let mut fitted = clamped;
    let width_for_height = (clamped.h * r).round();
    if width_for_height <= clamped.w {
        fitted.w = width_for_height;
    } else {
        fitted.h = (clamped.w / r).round();
    }
    if let Some((handle, start)) = pinned {
        if handle.hx == -1 {
            fitted.x = start.right() - fitted.w;
        }
        if handle.hy == -1 {
            fitted.y = start.bottom() - fitted.h;
        }
    }
    clamp(fitted, display)
}

/// Fold one event into the crop state.
pub fn update_crop(state: CropState, event: CropEvent) -> CropState {
    match event {
        CropEvent::PointerDown { x, y } => pointer_down(state, Point::new(x, y)),
        CropEvent::PointerMove { x, y } => pointer_move(state, Point::new(x, y)),
        CropEvent::PointerUp | CropEvent::PointerCancel => CropState {
            drag: DragState::Idle,
            ..state
        },
        CropEvent::SetAspectRatio { ratio } => set_aspect_ratio(state, ratio),
        CropEvent::SetField { field, value } => set_field(state, field, value),
        CropEvent::RotateClockwise => CropState {
            rotation: state.rotation.clockwise(),
            ..state
        },
        CropEvent::RotateCounterClockwise => CropState {
            rotation: state.rotation.counter_clockwise(),
            ..state
        },
        CropEvent::ToggleFlipH => CropState {
            flip_h: !state.flip_h,
            ..state
        },
        CropEvent::ToggleFlipV => CropState {
            flip_v: !state.flip_v,
            ..state
        },
        CropEvent::Reset => CropState::new(state.display, state.natural),
    }
}

fn pointer_down(state: CropState, p: Point) -> CropState {
    if state.is_dragging() {
        return state;
    }
    let Some(mode) = state.hit_test(p) else {
        return state;
    };

    let (rect, start_rect) = match mode {
        DragMode::CreateNew => {
            let seed = Rect::new(p.x, p.y, 0.0, 0.0);
            (clamp(seed, state.display), seed)
        }
        DragMode::Move | DragMode::Handle(_) => (state.rect, state.rect),
    };

    CropState {
        rect,
        drag: DragState::Dragging {
            mode,
            start_rect,
            start_pointer: p,
        },
        ..state
    }
}

fn pointer_move(state: CropState, p: Point) -> CropState {
    let DragState::Dragging {
        mode,
        start_rect: start,
        start_pointer,
    } = state.drag
    else {
        return state;
    };

    let dx = p.x - start_pointer.x;
    let dy = p.y - start_pointer.y;
    let display = state.display;

    let rect = match mode {
        DragMode::Move => {
            let x = (start.x + dx).min(display.w - start.w).max(0.0);
            let y = (start.y + dy).min(display.h - start.h).max(0.0);
            clamp(Rect { x, y, ..start }, display)
        }
        DragMode::CreateNew => {
            let spanned = Rect {
                x: start_pointer.x.min(p.x),
                y: start_pointer.y.min(p.y),
                w: dx.abs(),
                h: dy.abs(),
            };
            constrain(
                enforce_aspect_ratio(spanned, state.aspect, Anchor::Width),
                state.aspect,
                display,
            )
        }
        DragMode::Handle(handle) => {
            let resized = drag_handle(start, handle, dx, dy, state.aspect);
            constrain_pinned(resized, state.aspect, display, Some((handle, start)))
        }
    };

    CropState { rect, ..state }
}

/// Move the edges named by `handle`, each independently, never letting a
/// dragged edge cross within [`MIN_SIZE`] of its opposite edge.
fn drag_handle(start: Rect, handle: Handle, dx: f64, dy: f64, aspect: AspectRatio) -> Rect {
    let mut r = start;

    match handle.hx {
        -1 => {
            let x = (start.x + dx).min(start.right() - MIN_SIZE);
            r.x = x;
            r.w = start.right() - x;
        }
        1 => r.w = MIN_SIZE.max(start.w + dx),
        _ => {}
    }
    match handle.hy {
        -1 => {
            let y = (start.y + dy).min(start.bottom() - MIN_SIZE);
            r.y = y;
            r.h = start.bottom() - y;
        }
        1 => r.h = MIN_SIZE.max(start.h + dy),
        _ => {}
    }

    if handle.is_corner() && aspect.effective().is_some() {
        // Follow whichever axis the user is dragging harder
        let anchor = if dy.abs() > dx.abs() {
            Anchor::Height
        } else {
            Anchor::Width
        };
        r = enforce_aspect_ratio(r, aspect, anchor);
        // The corner opposite the grabbed one stays fixed
        if handle.hx == -1 {
            r.x = start.right() - r.w;
        }
        if handle.hy == -1 {
            r.y = start.bottom() - r.h;
        }
    }

    r
}

fn set_aspect_ratio(state: CropState, ratio: AspectRatio) -> CropState {
    let rect = if ratio.effective().is_some() {
        constrain(
            enforce_aspect_ratio(state.rect, ratio, Anchor::Width),
            ratio,
            state.display,
        )
    } else {
        state.rect
    };
    CropState {
        aspect: ratio,
        rect,
        ..state
    }
}

/// Apply a precision input given in natural pixels.
fn set_field(state: CropState, field: CropField, value: f64) -> CropState {
    let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
    // Natural -> display factors are the inverse of the mapper's scale
    let scale = Scale::between(state.display, state.natural);
    let to_disp_x = |v: f64| (v / scale.x).round();
    let to_disp_y = |v: f64| (v / scale.y).round();

    let mut next = state.rect;
    match field {
        CropField::X => next.x = to_disp_x(value),
        CropField::Y => next.y = to_disp_y(value),
        CropField::W => next.w = to_disp_x(value),
        CropField::H => next.h = to_disp_y(value),
    }

    let anchor = if field == CropField::H {
        Anchor::Height
    } else {
        Anchor::Width
    };
    let rect = constrain(
        enforce_aspect_ratio(next, state.aspect, anchor),
        state.aspect,
        state.display,
    );
    CropState { rect, ..state }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(w: f64, h: f64) -> CropState {
        CropState::new(Size::new(w, h), Size::new(w * 2.0, h * 2.0))
    }

    fn with_rect(state: CropState, x: f64, y: f64, w: f64, h: f64) -> CropState {
        CropState {
            rect: Rect::new(x, y, w, h),
            ..state
        }
    }

    fn drag(state: CropState, from: (f64, f64), to: (f64, f64)) -> CropState {
        let s = update_crop(state, CropEvent::PointerDown { x: from.0, y: from.1 });
        let s = update_crop(s, CropEvent::PointerMove { x: to.0, y: to.1 });
        update_crop(s, CropEvent::PointerUp)
    }

    #[test]
    fn test_new_session_covers_full_image() {
        let s = session(500.0, 400.0);
        assert_eq!(s.rect, Rect::new(0.0, 0.0, 500.0, 400.0));
        assert_eq!(s.aspect, AspectRatio::Free);
        assert_eq!(s.rotation, Rotation::Deg0);
        assert!(!s.is_dragging());
        assert!(s.is_identity());
    }

    #[test]
    fn test_natural_rect_is_derived() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 400.0, 300.0);
        assert_eq!(s.natural_rect(), PixelRect::new(200, 200, 800, 600));
    }

    #[test]
    fn test_clamp_formula() {
        let display = Size::new(200.0, 100.0);

        assert_eq!(clamp(Rect::new(150.0, 50.0, 100.0, 100.0), display), Rect::new(150.0, 50.0, 50.0, 50.0));
        assert_eq!(clamp(Rect::new(10.0, 10.0, 5.0, 5.0), display), Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(clamp(Rect::new(195.0, 95.0, 5.0, 5.0), display), Rect::new(180.0, 80.0, 20.0, 20.0));
    }

    #[test]
    fn test_clamp_trims_negative_origin() {
        let display = Size::new(200.0, 200.0);
        let r = clamp(Rect::new(-50.0, -10.0, 250.0, 60.0), display);
        assert_eq!(r, Rect::new(0.0, 0.0, 200.0, 50.0));
    }

    #[test]
    fn test_enforce_anchored_on_width() {
        let r = enforce_aspect_ratio(Rect::new(0.0, 0.0, 400.0, 100.0), AspectRatio::Fixed(16.0 / 9.0), Anchor::Width);
        assert_eq!(r.h, 225.0);
        assert_eq!(r.w, 400.0);
    }

    #[test]
    fn test_enforce_anchored_on_height() {
        let r = enforce_aspect_ratio(Rect::new(0.0, 0.0, 10.0, 300.0), AspectRatio::Fixed(4.0 / 3.0), Anchor::Height);
        assert_eq!(r.w, 400.0);
    }

    #[test]
    fn test_enforce_free_is_noop() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(enforce_aspect_ratio(rect, AspectRatio::Free, Anchor::Width), rect);
        assert_eq!(enforce_aspect_ratio(rect, AspectRatio::Fixed(0.0), Anchor::Width), rect);
    }

    #[test]
    fn test_circle_ratio_drives_height_to_width() {
        let s = CropState::new(Size::new(300.0, 400.0), Size::new(300.0, 400.0));
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Circle });

        assert_eq!(s.rect.w, 300.0);
        assert_eq!(s.rect.h, 300.0);
        assert_eq!(s.natural_rect(), PixelRect::new(0, 0, 300, 300));
    }

    #[test]
    fn test_circle_is_distinct_from_square() {
        assert_eq!(AspectRatio::Circle.effective(), AspectRatio::Fixed(1.0).effective());
        assert!(AspectRatio::Circle.is_circle());
        assert!(!AspectRatio::Fixed(1.0).is_circle());
    }

    #[test]
    fn test_switching_to_free_keeps_rect() {
        let s = with_rect(session(500.0, 400.0), 10.0, 10.0, 160.0, 90.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Free });
        assert_eq!(s.rect, Rect::new(10.0, 10.0, 160.0, 90.0));
    }

    #[test]
    fn test_ratio_change_that_overflows_is_refitted() {
        // 9:16 on a full-width landscape rect would need h = 889
        let s = session(500.0, 400.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(9.0 / 16.0) });

        assert!(s.rect.bottom() <= 400.0);
        assert!(matches_ratio(&s.rect, 9.0 / 16.0), "{:?}", s.rect);
        assert_eq!(s.rect.h, 400.0);
        assert_eq!(s.rect.w, 225.0);
    }

    #[test]
    fn test_hit_test_priorities() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);

        assert_eq!(s.hit_test(Point::new(101.0, 99.0)), Some(DragMode::Handle(Handle::new(-1, -1))));
        assert_eq!(s.hit_test(Point::new(200.0, 200.0)), Some(DragMode::Handle(Handle::new(0, 1))));
        assert_eq!(s.hit_test(Point::new(150.0, 150.0)), Some(DragMode::Move));
        assert_eq!(s.hit_test(Point::new(20.0, 20.0)), Some(DragMode::CreateNew));
        assert_eq!(s.hit_test(Point::new(-5.0, 20.0)), None);
        assert_eq!(s.hit_test(Point::new(20.0, 401.0)), None);
    }

    #[test]
    fn test_pointer_down_outside_image_is_ignored() {
        let s = session(500.0, 400.0);
        let next = update_crop(s, CropEvent::PointerDown { x: 600.0, y: 10.0 });
        assert_eq!(next, s);
    }

    #[test]
    fn test_move_translates_and_stops_at_edges() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);

        let moved = drag(s, (150.0, 150.0), (170.0, 140.0));
        assert_eq!(moved.rect, Rect::new(120.0, 90.0, 200.0, 100.0));

        let pinned = drag(s, (150.0, 150.0), (900.0, -900.0));
        assert_eq!(pinned.rect, Rect::new(300.0, 0.0, 200.0, 100.0));
        assert!(!pinned.is_dragging());
    }

    #[test]
    fn test_create_new_normalizes_span() {
        let s = with_rect(session(500.0, 400.0), 0.0, 0.0, 50.0, 50.0);

        // Drag up-left from (300, 300) to (200, 250)
        let s = drag(s, (300.0, 300.0), (200.0, 250.0));
        assert_eq!(s.rect, Rect::new(200.0, 250.0, 100.0, 50.0));
    }

    #[test]
    fn test_create_new_starts_at_min_size() {
        let s = with_rect(session(500.0, 400.0), 0.0, 0.0, 50.0, 50.0);
        let s = update_crop(s, CropEvent::PointerDown { x: 300.0, y: 300.0 });

        assert!(s.is_dragging());
        assert_eq!(s.rect, Rect::new(300.0, 300.0, MIN_SIZE, MIN_SIZE));
    }

    #[test]
    fn test_create_new_with_ratio_anchors_on_width() {
        let s = with_rect(session(500.0, 400.0), 0.0, 0.0, 50.0, 50.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });
        let s = drag(s, (100.0, 100.0), (300.0, 350.0));

        assert_eq!(s.rect, Rect::new(100.0, 100.0, 200.0, 100.0));
    }

    #[test]
    fn test_create_new_past_image_edge() {
        let s = with_rect(session(500.0, 400.0), 0.0, 0.0, 50.0, 50.0);
        let s = drag(s, (100.0, 100.0), (-50.0, 600.0));

        // Right edge stays on the anchor, span is trimmed to the image
        assert_eq!(s.rect, Rect::new(0.0, 100.0, 100.0, 300.0));
    }

    #[test]
    fn test_right_handle_grows_width_only() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = drag(s, (300.0, 150.0), (350.0, 170.0));
        assert_eq!(s.rect, Rect::new(100.0, 100.0, 250.0, 100.0));
    }

    #[test]
    fn test_left_handle_keeps_right_edge() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = drag(s, (100.0, 150.0), (150.0, 150.0));
        assert_eq!(s.rect, Rect::new(150.0, 100.0, 150.0, 100.0));
    }

    #[test]
    fn test_left_handle_cannot_cross_min_size() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = drag(s, (100.0, 150.0), (450.0, 150.0));
        assert_eq!(s.rect.x, 280.0);
        assert_eq!(s.rect.w, MIN_SIZE);
    }

    #[test]
    fn test_top_handle_past_image_edge() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = drag(s, (200.0, 100.0), (200.0, -300.0));
        assert_eq!(s.rect, Rect::new(100.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_corner_handle_enforces_ratio_on_dominant_axis() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });

        // Mostly horizontal: width wins
        let h = drag(s, (300.0, 200.0), (360.0, 210.0));
        assert_eq!(h.rect, Rect::new(100.0, 100.0, 260.0, 130.0));

        // Mostly vertical: height wins
        let v = drag(s, (300.0, 200.0), (305.0, 250.0));
        assert_eq!(v.rect, Rect::new(100.0, 100.0, 300.0, 150.0));
    }

    #[test]
    fn test_top_left_corner_keeps_opposite_corner() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });
        let s = drag(s, (100.0, 100.0), (60.0, 95.0));

        assert_eq!(s.rect.right(), 300.0);
        assert_eq!(s.rect.bottom(), 200.0);
        assert_eq!(s.rect.w, 240.0);
        assert_eq!(s.rect.h, 120.0);
    }

    #[test]
    fn test_top_left_corner_past_edge_keeps_opposite_corner() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });
        let s = drag(s, (100.0, 100.0), (-200.0, 90.0));

        assert_eq!(s.rect, Rect::new(0.0, 50.0, 300.0, 150.0));
        assert_eq!(s.rect.right(), 300.0);
        assert_eq!(s.rect.bottom(), 200.0);
    }

    #[test]
    fn test_top_right_corner_past_edge_keeps_bottom_left() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });
        let s = drag(s, (300.0, 100.0), (700.0, 90.0));

        assert_eq!(s.rect, Rect::new(100.0, 0.0, 400.0, 200.0));
        assert_eq!(s.rect.x, 100.0);
        assert_eq!(s.rect.bottom(), 200.0);
    }

    #[test]
    fn test_edge_handle_ignores_ratio() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });
        let s = drag(s, (300.0, 150.0), (340.0, 150.0));
        assert_eq!(s.rect, Rect::new(100.0, 100.0, 240.0, 100.0));
    }

    #[test]
    fn test_pointer_cancel_returns_to_idle() {
        let s = with_rect(session(500.0, 400.0), 100.0, 100.0, 200.0, 100.0);
        let s = update_crop(s, CropEvent::PointerDown { x: 150.0, y: 150.0 });
        assert!(s.is_dragging());

        let s = update_crop(s, CropEvent::PointerCancel);
        assert!(!s.is_dragging());

        // Moves after the gesture ended do nothing
        let after = update_crop(s, CropEvent::PointerMove { x: 400.0, y: 400.0 });
        assert_eq!(after, s);
    }

    #[test]
    fn test_set_field_converts_natural_to_display() {
        // display is half the natural size
        let s = with_rect(session(500.0, 400.0), 0.0, 0.0, 100.0, 100.0);

        let s = update_crop(s, CropEvent::SetField { field: CropField::X, value: 200.0 });
        assert_eq!(s.rect.x, 100.0);
        let s = update_crop(s, CropEvent::SetField { field: CropField::W, value: 300.0 });
        assert_eq!(s.rect.w, 150.0);
        assert_eq!(s.natural_rect(), PixelRect::new(200, 0, 300, 200));
    }

    #[test]
    fn test_set_field_negative_becomes_zero() {
        let s = with_rect(session(500.0, 400.0), 50.0, 50.0, 100.0, 100.0);
        let s = update_crop(s, CropEvent::SetField { field: CropField::Y, value: -40.0 });
        assert_eq!(s.rect.y, 0.0);
    }

    #[test]
    fn test_set_field_height_anchors_ratio_on_height() {
        let s = with_rect(session(500.0, 400.0), 0.0, 0.0, 100.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Fixed(2.0) });
        let s = update_crop(s, CropEvent::SetField { field: CropField::H, value: 200.0 });

        assert_eq!(s.rect.h, 100.0);
        assert_eq!(s.rect.w, 200.0);
    }

    #[test]
    fn test_set_field_is_clamped() {
        let s = session(500.0, 400.0);
        let s = update_crop(s, CropEvent::SetField { field: CropField::W, value: 99_999.0 });
        assert_eq!(s.rect.w, 500.0);
    }

    #[test]
    fn test_rotation_and_flip_events() {
        let s = session(500.0, 400.0);
        let s = update_crop(s, CropEvent::RotateCounterClockwise);
        assert_eq!(s.rotation, Rotation::Deg270);
        let s = update_crop(s, CropEvent::RotateClockwise);
        let s = update_crop(s, CropEvent::RotateClockwise);
        assert_eq!(s.rotation, Rotation::Deg90);

        let s = update_crop(s, CropEvent::ToggleFlipH);
        assert!(s.flip_h && !s.flip_v);
        let s = update_crop(s, CropEvent::ToggleFlipV);
        assert!(s.flip_v);
        assert!(!s.is_identity());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let s = with_rect(session(500.0, 400.0), 50.0, 50.0, 100.0, 100.0);
        let s = update_crop(s, CropEvent::SetAspectRatio { ratio: AspectRatio::Circle });
        let s = update_crop(s, CropEvent::RotateClockwise);
        let s = update_crop(s, CropEvent::ToggleFlipV);

        let reset = update_crop(s, CropEvent::Reset);
        assert_eq!(reset, session(500.0, 400.0));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::Deg0));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_four_quarter_turns_cycle() {
        let mut r = Rotation::Deg0;
        for _ in 0..4 {
            r = r.clockwise();
        }
        assert_eq!(r, Rotation::Deg0);
        assert!(Rotation::Deg90.swaps_dimensions());
        assert!(!Rotation::Deg180.swaps_dimensions());
    }

    #[test]
    fn test_handle_positions() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(Handle::new(-1, -1).position(&rect), Point::new(10.0, 20.0));
        assert_eq!(Handle::new(0, 1).position(&rect), Point::new(60.0, 70.0));
        assert_eq!(Handle::new(1, 0).position(&rect), Point::new(110.0, 45.0));
        assert_eq!(HANDLES.iter().filter(|h| h.is_corner()).count(), 4);
    }
}
