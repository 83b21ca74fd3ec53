//! # qrlayout - Sticker Layout Templating and Rendering
//!
//! qrlayout composes labels out of positioned text and QR elements, binds
//! them to data records through `{{fieldName}}` tokens, and renders them to
//! raster images at any resolution. It provides:
//!
//! - **Layout model**: a JSON-stable [`StickerLayout`] in millimetres, inches or pixels
//! - **Template binding**: `{{field}}` substitution, missing fields render empty
//! - **QR encoding**: a shared, in-flight-aware [`QrCache`]
//! - **Rendering**: layout + record → draw program → raster surface
//! - **Designer**: an interactive editing session with drag, resize and live preview
//!
//! ## Quick Start
//!
//! ```no_run
//! use qrlayout::{DataRecord, StickerLayout, StickerPrinter, units::Resolution};
//!
//! # async fn example() -> Result<(), qrlayout::LayoutError> {
//! let layout = StickerLayout::sample_badge();
//!
//! let mut record = DataRecord::new();
//! record.insert("fullName".into(), "Alex Johnson".into());
//! record.insert("employeeId".into(), "EMP-2024-889".into());
//! record.insert("department".into(), "Engineering".into());
//!
//! // 10 px/mm: the 85 mm badge comes out 850 px wide
//! let printer = StickerPrinter::new(Resolution::per_mm(10.0));
//! let png = printer.render_png(&layout, &record).await?;
//! std::fs::write("badge.png", png)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`units`] | Unit conversion and resolutions |
//! | [`layout`] | Layout model, schemas, JSON interchange |
//! | [`template`] | `{{field}}` binding |
//! | [`qr`] | QR encoding and cache |
//! | [`ir`] | Draw commands |
//! | [`render`] | Planning and the standalone printer |
//! | [`preview`] | Raster backend |
//! | [`designer`] | Interactive editing sessions |
//! | [`server`] | HTTP rendering service |
//! | [`error`] | Error types |

pub mod designer;
pub mod error;
pub mod ir;
pub mod layout;
pub mod preview;
pub mod qr;
pub mod render;
pub mod server;
pub mod template;
pub mod units;

// Re-exports for convenience
pub use error::LayoutError;
pub use layout::{DataRecord, Element, EntitySchema, StickerLayout};
pub use qr::QrCache;
pub use render::StickerPrinter;
