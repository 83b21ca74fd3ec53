//! # Intermediate Representation (IR)
//!
//! The IR is the seam between layout logic and pixels. A renderer turns a
//! layout and a record into a [`Program`]; a backend executes it against a
//! raster surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │   Layout    │ ──► │     IR      │ ──► │   Surface    │
//! │  + Record   │     │  (Vec<Op>)  │     │ (RGBA image) │
//! └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! Keeping the program inspectable means the hard part (geometry, binding,
//! paint order) is unit-tested without looking at pixels.
//!
//! ## Example
//!
//! ```
//! use qrlayout::ir::{Op, Program};
//! use qrlayout::layout::Color;
//! use qrlayout::preview::Surface;
//!
//! let mut program = Program::new();
//! program.push(Op::Clear { width: 40, height: 20, background: Color::WHITE });
//!
//! let mut surface = Surface::new(1, 1);
//! qrlayout::preview::execute(&program, &mut surface);
//! assert_eq!((surface.width(), surface.height()), (40, 20));
//! ```

mod ops;

pub use ops::*;
