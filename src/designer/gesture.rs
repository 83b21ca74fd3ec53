//! Pointer gestures: hit testing, drag and resize math.
//!
//! Everything here is pure. Pointer positions are preview pixels; element
//! geometry stays in the layout's unit, converted with the session's
//! resolution.

use crate::ir::PixelRect;
use crate::layout::Element;

/// Pointer travel (in preview pixels) before a press becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Side of the square resize handles, in preview pixels.
pub const HANDLE_SIZE_PX: i32 = 8;

/// Smallest element side a resize can produce, in preview pixels.
pub const MIN_SIZE_PX: f64 = 4.0;

/// Pointer position in preview pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Element geometry in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Geometry {
    pub fn of(element: &Element) -> Self {
        Self {
            x: element.x,
            y: element.y,
            w: element.w,
            h: element.h,
        }
    }

    pub fn apply_to(&self, element: &mut Element) {
        element.x = self.x;
        element.y = self.y;
        element.w = self.w;
        element.h = self.h;
    }

    /// Move by `(dx, dy)`, keeping the element inside `0..limit` where it fits.
    pub fn translated(&self, dx: f64, dy: f64, limit_w: f64, limit_h: f64) -> Self {
        Self {
            x: clamp_start(self.x + dx, self.w, limit_w),
            y: clamp_start(self.y + dy, self.h, limit_h),
            ..*self
        }
    }

    /// Resize by dragging `handle` by `(dx, dy)`.
    ///
    /// The opposite corner stays fixed. Sides never drop below `min_size`
    /// and dragged edges stay within `0..limit`.
    pub fn resized(
        &self,
        handle: Handle,
        dx: f64,
        dy: f64,
        min_size: f64,
        limit_w: f64,
        limit_h: f64,
    ) -> Self {
        let (left, right) = if handle.moves_left() {
            let right = self.x + self.w;
            let left = (self.x + dx).max(0.0).min(right - min_size);
            (left, right)
        } else {
            let right = (self.x + self.w + dx).min(limit_w.max(self.x + min_size));
            (self.x, right.max(self.x + min_size))
        };
        let (top, bottom) = if handle.moves_top() {
            let bottom = self.y + self.h;
            let top = (self.y + dy).max(0.0).min(bottom - min_size);
            (top, bottom)
        } else {
            let bottom = (self.y + self.h + dy).min(limit_h.max(self.y + min_size));
            (self.y, bottom.max(self.y + min_size))
        };
        Self {
            x: left,
            y: top,
            w: right - left,
            h: bottom - top,
        }
    }
}

fn clamp_start(start: f64, size: f64, limit: f64) -> f64 {
    if size >= limit {
        return 0.0;
    }
    start.clamp(0.0, limit - size)
}

/// Corner resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomLeft)
    }

    fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopRight)
    }

    /// Handle square for an element's pixel bounds.
    pub fn rect(self, bounds: PixelRect) -> PixelRect {
        let half = HANDLE_SIZE_PX / 2;
        let cx = if self.moves_left() {
            bounds.x
        } else {
            bounds.right()
        };
        let cy = if self.moves_top() {
            bounds.y
        } else {
            bounds.bottom()
        };
        PixelRect::new(
            cx.saturating_sub(half),
            cy.saturating_sub(half),
            HANDLE_SIZE_PX as u32,
            HANDLE_SIZE_PX as u32,
        )
    }

    /// Handle under `point`, if any.
    pub fn hit(bounds: PixelRect, point: Point) -> Option<Handle> {
        let (px, py) = (point.x.floor() as i32, point.y.floor() as i32);
        Handle::ALL
            .into_iter()
            .find(|h| h.rect(bounds).contains(px, py))
    }
}

/// Interaction state of a designer session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pointer is down on an element but hasn't moved past the threshold.
    Selecting {
        id: String,
        origin: Point,
        original: Geometry,
    },
    Dragging {
        id: String,
        origin: Point,
        original: Geometry,
        current: Geometry,
    },
    Resizing {
        id: String,
        handle: Handle,
        origin: Point,
        original: Geometry,
        current: Geometry,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Uncommitted geometry of an in-flight drag or resize.
    pub fn pending(&self) -> Option<(&str, Geometry)> {
        match self {
            Gesture::Dragging { id, current, .. } | Gesture::Resizing { id, current, .. } => {
                Some((id, *current))
            }
            _ => None,
        }
    }
}
