//! Text styling and color parsing.
//!
//! Style values are kept close to their JSON spelling so a layout written by
//! another tool survives a load/save cycle unchanged. Interpretation
//! (bold or not, which alignment, which pixel color) happens here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LayoutError;

/// Default text size in CSS pixels.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse(s: &str) -> Result<Self, LayoutError> {
        let bad = || LayoutError::MalformedLayout(format!("invalid color '{}'", s));
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|n| n * 17)
                .map_err(|_| bad())
        };
        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(bad()),
        }
    }

    /// Lowercase `#rrggbb` (alpha dropped when opaque).
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Horizontal text alignment within an element's width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    #[serde(rename = "left", alias = "start")]
    Start,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "right", alias = "end")]
    End,
}

/// Vertical text alignment within an element's height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VAlign {
    #[default]
    #[serde(rename = "top", alias = "start")]
    Start,
    #[serde(rename = "middle", alias = "center")]
    Middle,
    #[serde(rename = "bottom", alias = "end")]
    End,
}

/// Font weight as written in the layout: `"bold"`, `"normal"`, `"700"`, `700`
/// or `700.0`. Anything else is kept verbatim and drawn at normal weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u16),
    Float(f64),
    Named(String),
    Other(Value),
}

impl FontWeight {
    pub fn bold() -> Self {
        FontWeight::Named("bold".to_string())
    }

    pub fn is_bold(&self) -> bool {
        match self {
            FontWeight::Numeric(n) => *n >= 600,
            FontWeight::Float(n) => n.round() >= 600.0,
            FontWeight::Named(name) => match name.trim() {
                "bold" | "bolder" => true,
                other => other.parse::<u16>().map(|n| n >= 600).unwrap_or(false),
            },
            FontWeight::Other(_) => false,
        }
    }
}

/// Style block of a text element. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<HAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Fields this crate does not interpret, kept for round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextStyle {
    /// Resolve defaults into concrete drawing parameters.
    ///
    /// An unparseable color falls back to black here; layout validation
    /// rejects such documents before rendering starts.
    pub fn resolve(style: Option<&TextStyle>) -> ResolvedStyle {
        let Some(style) = style else {
            return ResolvedStyle::default();
        };
        ResolvedStyle {
            font_size: style
                .font_size
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(DEFAULT_FONT_SIZE),
            bold: style.font_weight.as_ref().is_some_and(FontWeight::is_bold),
            h_align: style.text_align.unwrap_or_default(),
            v_align: style.vertical_align.unwrap_or_default(),
            color: style
                .color
                .as_deref()
                .and_then(|c| Color::parse(c).ok())
                .unwrap_or(Color::BLACK),
        }
    }
}

/// Text style with every default applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle {
    /// Font size in CSS pixels (before resolution scaling).
    pub font_size: f64,
    pub bold: bool,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub color: Color,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            h_align: HAlign::Start,
            v_align: VAlign::Start,
            color: Color::BLACK,
        }
    }
}
