//! # Unit Conversion
//!
//! Maps lengths in a layout's unit to device pixels and back.
//!
//! ## Resolution
//!
//! A [`Resolution`] is stored as pixels per millimetre; the per-inch value is
//! derived from it.
//!
//! ```text
//! px_per_inch = px_per_mm * 25.4
//!
//! 85mm badge at 10 px/mm:
//!   85 * 10 = 850 px
//! ```
//!
//! | Preset | DPI | px/mm |
//! |--------|-----|-------|
//! | `SCREEN` | 96 | ≈3.78 |
//! | `THERMAL_203` | 203 | ≈7.99 |
//! | `PRINT_300` | 300 | ≈11.81 |
//!
//! ## Usage
//!
//! ```
//! use qrlayout::units::{Resolution, Unit};
//!
//! let res = Resolution::per_mm(10.0);
//! assert_eq!(res.to_pixels(85.0, Unit::Millimeter), 850.0);
//! assert_eq!(res.from_pixels(850.0, Unit::Millimeter), 85.0);
//! ```

use serde::{Deserialize, Serialize};

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// CSS reference pixel density. Font sizes are expressed at this density.
pub const CSS_DPI: f64 = 96.0;

/// Unit a layout's geometry is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "mm", alias = "millimeter")]
    Millimeter,
    #[serde(rename = "in", alias = "inch")]
    Inch,
    #[serde(rename = "px", alias = "pixel")]
    Pixel,
}

impl Unit {
    /// Short suffix used in the JSON interchange format.
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Millimeter => "mm",
            Unit::Inch => "in",
            Unit::Pixel => "px",
        }
    }
}

/// Device pixels per physical length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    px_per_mm: f64,
}

impl Resolution {
    /// Screen density used by the designer preview.
    pub const SCREEN: Resolution = Resolution {
        px_per_mm: CSS_DPI / MM_PER_INCH,
    };

    /// Thermal label printers (8 dots/mm).
    pub const THERMAL_203: Resolution = Resolution {
        px_per_mm: 203.0 / MM_PER_INCH,
    };

    /// Office laser/inkjet density. Printer default.
    pub const PRINT_300: Resolution = Resolution {
        px_per_mm: 300.0 / MM_PER_INCH,
    };

    /// Resolution from pixels per millimetre.
    pub fn per_mm(px_per_mm: f64) -> Self {
        Self { px_per_mm }
    }

    /// Resolution from dots per inch.
    pub fn dpi(dpi: f64) -> Self {
        Self {
            px_per_mm: dpi / MM_PER_INCH,
        }
    }

    pub fn px_per_mm(&self) -> f64 {
        self.px_per_mm
    }

    pub fn px_per_inch(&self) -> f64 {
        self.px_per_mm * MM_PER_INCH
    }

    /// Pixels per one `unit`. Pixel is always 1 regardless of resolution.
    pub fn scale(&self, unit: Unit) -> f64 {
        match unit {
            Unit::Millimeter => self.px_per_mm,
            Unit::Inch => self.px_per_inch(),
            Unit::Pixel => 1.0,
        }
    }

    /// Convert a length in `unit` to (fractional) device pixels.
    pub fn to_pixels(&self, length: f64, unit: Unit) -> f64 {
        length * self.scale(unit)
    }

    /// Convert a device pixel length back to `unit`.
    pub fn from_pixels(&self, pixels: f64, unit: Unit) -> f64 {
        pixels / self.scale(unit)
    }

    /// Multiplier from CSS pixels (font sizes) to device pixels.
    pub fn css_scale(&self) -> f64 {
        self.px_per_inch() / CSS_DPI
    }

    /// Whether this resolution can be used for drawing.
    pub fn is_valid(&self) -> bool {
        self.px_per_mm.is_finite() && self.px_per_mm > 0.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::PRINT_300
    }
}

/// Convert a length between two units at a given resolution.
///
/// Only pixel conversions depend on the resolution; mm ↔ in is fixed.
pub fn convert(length: f64, from: Unit, to: Unit, resolution: Resolution) -> f64 {
    if from == to {
        return length;
    }
    resolution.from_pixels(resolution.to_pixels(length, from), to)
}
