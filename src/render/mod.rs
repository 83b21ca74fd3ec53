//! # Rendering Module
//!
//! Turns a [`StickerLayout`](crate::layout::StickerLayout) and a
//! [`DataRecord`](crate::layout::DataRecord) into pixels.
//!
//! ## Modules
//!
//! - [`plan`]: validation, unit conversion and template binding (pure)
//! - [`printer`]: [`StickerPrinter`], the standalone print entry point
//!
//! ## Pipeline
//!
//! ```text
//! plan()          synchronous: validate, convert, bind
//! Plan::resolve   async: QR symbols from the shared cache, in element order
//! Rasterizer      synchronous: execute ops onto the surface
//! ```
//!
//! The designer preview and the printer share this pipeline, so what the
//! designer shows is what prints.

pub mod plan;
pub mod printer;

pub use plan::{
    MAX_CANVAS_PIXELS, Plan, PlannedContent, PlannedElement, canvas_size, pixel_bounds,
};
pub use printer::StickerPrinter;
