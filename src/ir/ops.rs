//! # Draw Commands
//!
//! The IR is an ordered list of draw commands in device pixels. Every unit
//! conversion, template binding and QR lookup has already happened by the
//! time an [`Op`] exists, so executing a program is pure pixel pushing.
//!
//! ```text
//! Layout + Record → plan (pure) → QR resolution (async) → Program → Surface
//! ```

use std::sync::Arc;

use crate::layout::{Color, HAlign, VAlign};
use crate::qr::QrSymbol;

/// Axis-aligned rectangle in device pixels. `x`/`y` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && py >= self.y && px < self.right() && py < self.bottom()
    }

    /// Overlap of two rectangles (empty if they don't touch).
    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return PixelRect::new(x0, y0, 0, 0);
        }
        PixelRect::new(
            x0,
            y0,
            (i64::from(x1) - i64::from(x0)) as u32,
            (i64::from(y1) - i64::from(y0)) as u32,
        )
    }
}

/// Fully resolved text drawing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Lines of already-bound text.
    pub lines: Vec<String>,
    /// Glyph cell height in device pixels.
    pub pixel_height: f32,
    pub bold: bool,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub color: Color,
}

/// Draw commands. Executed in order; later ops paint over earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Size the surface and fill it with the background color.
    Clear {
        width: u32,
        height: u32,
        background: Color,
    },

    /// Text block clipped to `bounds`.
    Text {
        element_id: String,
        bounds: PixelRect,
        run: TextRun,
    },

    /// QR symbol scaled uniformly to fit `bounds`, centered.
    Qr {
        element_id: String,
        bounds: PixelRect,
        symbol: Arc<QrSymbol>,
    },
}

impl Op {
    /// Id of the layout element this op draws, if any.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Op::Clear { .. } => None,
            Op::Text { element_id, .. } | Op::Qr { element_id, .. } => Some(element_id),
        }
    }
}

/// A compiled draw program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Get the number of ops in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the program is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over ops.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Surface size requested by the leading `Clear`, if present.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        match self.ops.first() {
            Some(Op::Clear { width, height, .. }) => Some((*width, *height)),
            _ => None,
        }
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
