//! # Sticker Layout Model
//!
//! A [`StickerLayout`] is the persisted, reusable description of a label:
//! its size and unit, background, and an ordered list of [`Element`]s. The
//! same type is the Rust API and the JSON interchange format.
//!
//! ```
//! use qrlayout::layout::StickerLayout;
//!
//! let json = r##"{
//!     "id": "layout-1", "name": "Badge", "targetEntity": "employee",
//!     "width": 85, "height": 54, "unit": "mm", "backgroundColor": "#ffffff",
//!     "elements": [
//!         {"id": "name", "type": "text", "x": 5, "y": 38, "w": 75, "h": 6,
//!          "content": "{{fullName}}", "style": {"textAlign": "center"}}
//!     ]
//! }"##;
//!
//! let layout = StickerLayout::from_json(json).unwrap();
//! assert_eq!(layout.elements.len(), 1);
//! ```
//!
//! ## Paint order
//!
//! Elements are painted in array order: index 0 is at the bottom, the last
//! element is on top.
//!
//! ## Round-trips
//!
//! Fields this crate does not know about are collected into `extra` maps on
//! the layout, each element and each style block, and written back on save.

pub mod schema;
pub mod style;

pub use schema::{DataRecord, EntitySchema, FieldDescriptor, SchemaMap, builtin_schemas};
pub use style::{Color, FontWeight, HAlign, ResolvedStyle, TextStyle, VAlign};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::LayoutError;
use crate::units::Unit;

fn default_background() -> String {
    "#ffffff".to_string()
}

/// Kind of a layout element.
///
/// Types this crate cannot draw are kept as [`ElementKind::Other`] so the
/// layout still round-trips; the renderer skips them with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Text,
    Qr,
    Other(String),
}

impl From<String> for ElementKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => ElementKind::Text,
            "qr" => ElementKind::Qr,
            _ => ElementKind::Other(s),
        }
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Text => "text".to_string(),
            ElementKind::Qr => "qr".to_string(),
            ElementKind::Other(s) => s,
        }
    }
}

/// One positioned visual item in a layout.
///
/// Geometry is in the owning layout's unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Literal text with optional `{{field}}` tokens.
    #[serde(default)]
    pub content: String,
    /// Only meaningful for text elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    /// Only meaningful for QR elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_separator: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    fn new(kind: ElementKind, x: f64, y: f64, w: f64, h: f64, content: &str) -> Self {
        Self {
            id: new_id(),
            kind,
            x,
            y,
            w,
            h,
            content: content.to_string(),
            style: None,
            qr_separator: None,
            extra: Map::new(),
        }
    }

    /// Text element with a fresh id and default style.
    pub fn text(x: f64, y: f64, w: f64, h: f64, content: &str) -> Self {
        Self::new(ElementKind::Text, x, y, w, h, content)
    }

    /// QR element with a fresh id.
    pub fn qr(x: f64, y: f64, size: f64, content: &str) -> Self {
        Self::new(ElementKind::Qr, x, y, size, size, content)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.qr_separator = Some(separator.to_string());
        self
    }

    fn check_geometry(&self) -> Result<(), LayoutError> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(LayoutError::InvalidGeometry(format!(
                "element '{}' has a non-finite position",
                self.id
            )));
        }
        if !(self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0) {
            return Err(LayoutError::InvalidGeometry(format!(
                "element '{}' has non-positive size {}x{}",
                self.id, self.w, self.h
            )));
        }
        Ok(())
    }
}

/// Saved description of a label's size, unit and elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerLayout {
    pub id: String,
    pub name: String,
    /// Entity-type key selecting which schema/record shape this layout binds to.
    pub target_entity: String,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StickerLayout {
    /// Empty layout with a fresh id and white background.
    pub fn new(name: &str, target_entity: &str, width: f64, height: f64, unit: Unit) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            target_entity: target_entity.to_string(),
            width,
            height,
            unit,
            background_color: default_background(),
            elements: Vec::new(),
            extra: Map::new(),
        }
    }

    /// The 85×54 mm employee badge used as a starting point.
    pub fn sample_badge() -> Self {
        let mut layout = Self::new("Employee ID Card", "employee", 85.0, 54.0, Unit::Millimeter);
        layout.id = "layout-1".to_string();
        layout.elements = vec![
            Element::text(5.0, 5.0, 75.0, 8.0, "COMPANY NAME")
                .with_id("title")
                .with_style(TextStyle {
                    font_size: Some(14.0),
                    font_weight: Some(FontWeight::bold()),
                    text_align: Some(HAlign::Center),
                    vertical_align: Some(VAlign::Middle),
                    ..Default::default()
                }),
            Element::qr(32.5, 15.0, 20.0, "{{employeeId}}")
                .with_id("qr-code")
                .with_separator("|"),
            Element::text(5.0, 38.0, 75.0, 6.0, "{{fullName}}")
                .with_id("name-label")
                .with_style(TextStyle {
                    font_size: Some(12.0),
                    font_weight: Some(FontWeight::bold()),
                    text_align: Some(HAlign::Center),
                    ..Default::default()
                }),
            Element::text(5.0, 44.0, 75.0, 5.0, "{{department}}")
                .with_id("dept-label")
                .with_style(TextStyle {
                    font_size: Some(10.0),
                    text_align: Some(HAlign::Center),
                    color: Some("#666666".to_string()),
                    ..Default::default()
                }),
        ];
        layout
    }

    /// Parse the JSON interchange format. Does not validate geometry.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(json)
            .map_err(|e| LayoutError::MalformedLayout(format!("invalid layout JSON: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Paint-order index of an element.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Parsed background color.
    pub fn background(&self) -> Result<Color, LayoutError> {
        Color::parse(&self.background_color)
    }

    /// Check that the layout can be drawn.
    ///
    /// Rejects non-positive or non-finite sizes, elements that declare a
    /// unit other than the layout's, duplicate element ids and unparseable
    /// colors. Unknown element types are not an error.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
        {
            return Err(LayoutError::InvalidGeometry(format!(
                "layout '{}' has non-positive size {}x{}",
                self.id, self.width, self.height
            )));
        }
        self.background()?;

        let mut seen = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id.as_str()) {
                return Err(LayoutError::MalformedLayout(format!(
                    "duplicate element id '{}'",
                    element.id
                )));
            }
            element.check_geometry()?;

            if let Some(unit) = element.extra.get("unit") {
                let declared: Unit = serde_json::from_value(unit.clone()).map_err(|_| {
                    LayoutError::MalformedLayout(format!(
                        "element '{}' has unknown unit {}",
                        element.id, unit
                    ))
                })?;
                if declared != self.unit {
                    return Err(LayoutError::UnitMismatch(format!(
                        "element '{}' uses {} but layout uses {}",
                        element.id,
                        declared.suffix(),
                        self.unit.suffix()
                    )));
                }
            }

            if let Some(color) = element.style.as_ref().and_then(|s| s.color.as_deref()) {
                Color::parse(color)?;
            }
        }
        Ok(())
    }
}

/// Random identifier for new layouts and elements.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_badge_is_valid() {
        let layout = StickerLayout::sample_badge();
        layout.validate().unwrap();
        assert_eq!(layout.elements.len(), 4);
        assert_eq!(layout.elements[1].kind, ElementKind::Qr);
    }

    #[test]
    fn test_json_round_trip_preserves_unknown_fields() {
        let json = r##"{
            "id": "l1", "name": "N", "targetEntity": "employee",
            "width": 50, "height": 30, "unit": "mm", "backgroundColor": "#fff",
            "createdBy": "alice",
            "elements": [
                {"id": "e1", "type": "text", "x": 1, "y": 1, "w": 10, "h": 5,
                 "content": "hi", "locked": true,
                 "style": {"fontSize": 9, "fontFamily": "Inter"}},
                {"id": "e2", "type": "barcode", "x": 1, "y": 10, "w": 10, "h": 5,
                 "content": "{{sku}}"}
            ]
        }"##;
        let layout = StickerLayout::from_json(json).unwrap();
        assert_eq!(layout.extra["createdBy"], "alice");
        assert_eq!(layout.elements[0].extra["locked"], true);
        assert_eq!(
            layout.elements[0].style.as_ref().unwrap().extra["fontFamily"],
            "Inter"
        );
        assert_eq!(layout.elements[1].kind, ElementKind::Other("barcode".into()));

        let saved: Value = serde_json::from_str(&layout.to_json().unwrap()).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(saved["createdBy"], original["createdBy"]);
        assert_eq!(saved["elements"][0]["locked"], true);
        assert_eq!(saved["elements"][0]["style"]["fontFamily"], "Inter");
        assert_eq!(saved["elements"][1]["type"], "barcode");

        let reloaded = StickerLayout::from_json(&layout.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, layout);
    }

    #[test]
    fn test_required_fields_always_written() {
        let layout = StickerLayout::new("Empty", "vendor", 40.0, 20.0, Unit::Inch);
        let saved: Value = serde_json::from_str(&layout.to_json().unwrap()).unwrap();
        for key in [
            "id",
            "name",
            "targetEntity",
            "width",
            "height",
            "unit",
            "backgroundColor",
            "elements",
        ] {
            assert!(saved.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(saved["unit"], "in");
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut layout = StickerLayout::sample_badge();
        layout.width = 0.0;
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_degenerate_element_rejected() {
        let mut layout = StickerLayout::sample_badge();
        layout.elements[2].h = -1.0;
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_unit_mismatch_rejected() {
        let mut layout = StickerLayout::sample_badge();
        layout.elements[0]
            .extra
            .insert("unit".to_string(), Value::String("in".to_string()));
        assert!(matches!(layout.validate(), Err(LayoutError::UnitMismatch(_))));

        layout.elements[0]
            .extra
            .insert("unit".to_string(), Value::String("mm".to_string()));
        layout.validate().unwrap();
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut layout = StickerLayout::sample_badge();
        layout.elements[1].id = "title".to_string();
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::MalformedLayout(_))
        ));
    }

    #[test]
    fn test_bad_color_rejected() {
        let mut layout = StickerLayout::sample_badge();
        layout.background_color = "white".to_string();
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::MalformedLayout(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            StickerLayout::from_json("{\"id\": 3}"),
            Err(LayoutError::MalformedLayout(_))
        ));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut layout = StickerLayout::sample_badge();
        assert_eq!(layout.index_of("name-label"), Some(2));
        assert!(layout.element("nope").is_none());
        layout.element_mut("title").unwrap().content = "ACME".into();
        assert_eq!(layout.element("title").unwrap().content, "ACME");
    }
}
