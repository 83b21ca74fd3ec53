//! Layout planning: layout + record → positioned, bound elements.
//!
//! Planning is synchronous and pure. It validates the layout, converts
//! every element to device pixels, binds template tokens and decides what
//! each element will draw. The only thing left open is the QR symbol for
//! each QR payload, which [`Plan::resolve`] fetches from the cache.

use std::sync::Arc;
use tracing::warn;

use crate::error::LayoutError;
use crate::ir::{Op, PixelRect, Program, TextRun};
use crate::layout::{Color, DataRecord, Element, ElementKind, StickerLayout, TextStyle};
use crate::qr::{QrCache, QrSymbol};
use crate::template;
use crate::units::{Resolution, Unit};

/// What a planned element will draw.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedContent {
    Text(TextRun),
    /// Bound payload waiting for a QR symbol. Empty payloads draw nothing.
    Qr { payload: String },
    /// Unknown element type.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedElement {
    pub id: String,
    pub bounds: PixelRect,
    pub content: PlannedContent,
}

/// A layout bound to one record, in device pixels, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub elements: Vec<PlannedElement>,
}

/// Round a unit-relative span to pixel edges.
///
/// Both edges are rounded independently so abutting elements share an edge.
/// Edges are clamped to the `i32` range, so the span always fits a [`PixelRect`].
fn pixel_span(start: f64, length: f64, scale: f64) -> (i32, u32) {
    let edge = |v: f64| v.round().clamp(i32::MIN as f64, i32::MAX as f64);
    let a = edge(start * scale);
    let b = edge((start + length) * scale);
    (a as i32, (b - a).max(0.0) as u32)
}

/// Pixel bounds of an element whose geometry is in `unit`.
pub fn pixel_bounds(element: &Element, unit: Unit, resolution: Resolution) -> PixelRect {
    let scale = resolution.scale(unit);
    let (x, width) = pixel_span(element.x, element.w, scale);
    let (y, height) = pixel_span(element.y, element.h, scale);
    PixelRect::new(x, y, width, height)
}

/// Largest surface a layout may ask for: 64 megapixels, 256 MiB of RGBA.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

/// Surface size for a layout. Fails for degenerate or oversized layouts.
pub fn canvas_size(layout: &StickerLayout, resolution: Resolution) -> Result<(u32, u32), LayoutError> {
    if !resolution.is_valid() {
        return Err(LayoutError::InvalidGeometry(format!(
            "resolution must be positive, got {} px/mm",
            resolution.px_per_mm()
        )));
    }
    let width = resolution.to_pixels(layout.width, layout.unit).round();
    let height = resolution.to_pixels(layout.height, layout.unit).round();
    if !(width >= 1.0 && height >= 1.0 && width <= u32::MAX as f64 && height <= u32::MAX as f64) {
        return Err(LayoutError::InvalidGeometry(format!(
            "layout '{}' is {}x{} px at this resolution",
            layout.id, width, height
        )));
    }
    let (width, height) = (width as u32, height as u32);
    if u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
        return Err(LayoutError::InvalidGeometry(format!(
            "layout '{}' is {}x{} px, over the {} pixel limit",
            layout.id, width, height, MAX_CANVAS_PIXELS
        )));
    }
    Ok((width, height))
}

fn plan_text(element: &Element, record: &DataRecord, resolution: Resolution) -> TextRun {
    let bound = template::bind(&element.content, record);
    let style = TextStyle::resolve(element.style.as_ref());
    TextRun {
        lines: bound
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect(),
        pixel_height: (style.font_size * resolution.css_scale()) as f32,
        bold: style.bold,
        h_align: style.h_align,
        v_align: style.v_align,
        color: style.color,
    }
}

/// Validate and plan a layout against a record.
///
/// Fails before anything is drawn if the layout is structurally invalid.
pub fn plan(
    layout: &StickerLayout,
    record: &DataRecord,
    resolution: Resolution,
) -> Result<Plan, LayoutError> {
    layout.validate()?;
    let (width, height) = canvas_size(layout, resolution)?;

    let elements = layout
        .elements
        .iter()
        .map(|element| {
            let bounds = pixel_bounds(element, layout.unit, resolution);
            let content = match &element.kind {
                ElementKind::Text => PlannedContent::Text(plan_text(element, record, resolution)),
                ElementKind::Qr => PlannedContent::Qr {
                    payload: template::bind_qr(
                        &element.content,
                        record,
                        element.qr_separator.as_deref(),
                    ),
                },
                ElementKind::Other(kind) => {
                    warn!(element_id = %element.id, kind = %kind, "Skipping element of unknown type");
                    PlannedContent::Skipped
                }
            };
            PlannedElement {
                id: element.id.clone(),
                bounds,
                content,
            }
        })
        .collect();

    Ok(Plan {
        width,
        height,
        background: layout.background()?,
        elements,
    })
}

impl Plan {
    /// Distinct non-empty QR payloads, in first-use order.
    pub fn qr_payloads(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for el in &self.elements {
            if let PlannedContent::Qr { payload } = &el.content
                && !payload.is_empty()
                && !out.contains(&payload.as_str())
            {
                out.push(payload);
            }
        }
        out
    }

    /// Build the program, looking up QR symbols synchronously.
    ///
    /// A payload with no symbol leaves its element blank.
    pub fn compile(self, mut lookup: impl FnMut(&str) -> Option<Arc<QrSymbol>>) -> Program {
        let mut program = Program::new();
        program.push(Op::Clear {
            width: self.width,
            height: self.height,
            background: self.background,
        });

        for el in self.elements {
            match el.content {
                PlannedContent::Text(run) => program.push(Op::Text {
                    element_id: el.id,
                    bounds: el.bounds,
                    run,
                }),
                PlannedContent::Qr { payload } => {
                    if payload.is_empty() {
                        continue;
                    }
                    if let Some(symbol) = lookup(&payload) {
                        program.push(Op::Qr {
                            element_id: el.id,
                            bounds: el.bounds,
                            symbol,
                        });
                    }
                }
                PlannedContent::Skipped => {}
            }
        }
        program
    }

    /// Fetch every QR symbol from the cache, then build the program.
    ///
    /// Symbols are awaited before any op is emitted, so paint order is the
    /// layout's element order no matter how long each encode takes.
    pub async fn resolve(self, cache: &QrCache) -> Program {
        let mut symbols = std::collections::HashMap::new();
        for payload in self.qr_payloads() {
            if let Some(symbol) = cache.get(payload).await {
                symbols.insert(payload.to_string(), symbol);
            }
        }
        self.compile(|payload| symbols.get(payload).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, HAlign};

    fn record(pairs: &[(&str, &str)]) -> DataRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canvas_size_mm() {
        let layout = StickerLayout::new("L", "employee", 85.0, 54.0, Unit::Millimeter);
        assert_eq!(canvas_size(&layout, Resolution::per_mm(10.0)).unwrap(), (850, 540));
    }

    #[test]
    fn test_canvas_size_pixels_ignore_resolution() {
        let layout = StickerLayout::new("L", "employee", 300.0, 200.0, Unit::Pixel);
        assert_eq!(canvas_size(&layout, Resolution::per_mm(10.0)).unwrap(), (300, 200));
    }

    #[test]
    fn test_canvas_size_rejects_subpixel() {
        let layout = StickerLayout::new("L", "employee", 0.01, 10.0, Unit::Millimeter);
        assert!(matches!(
            canvas_size(&layout, Resolution::per_mm(10.0)),
            Err(LayoutError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_canvas_size_rejects_oversized() {
        let layout = StickerLayout::new("L", "employee", 200_000.0, 200_000.0, Unit::Millimeter);
        assert!(layout.validate().is_ok());
        assert!(matches!(
            canvas_size(&layout, Resolution::per_mm(10.0)),
            Err(LayoutError::InvalidGeometry(_))
        ));

        // A4 at 600 DPI fits.
        let a4 = StickerLayout::new("A4", "employee", 210.0, 297.0, Unit::Millimeter);
        assert!(canvas_size(&a4, Resolution::dpi(600.0)).is_ok());
    }

    #[test]
    fn test_pixel_bounds_share_edges() {
        let a = Element::text(0.0, 0.0, 3.33, 1.0, "");
        let b = Element::text(3.33, 0.0, 3.33, 1.0, "");
        let res = Resolution::per_mm(7.0);
        let ra = pixel_bounds(&a, Unit::Millimeter, res);
        let rb = pixel_bounds(&b, Unit::Millimeter, res);
        assert_eq!(ra.right(), rb.x);
    }

    #[test]
    fn test_pixel_bounds_clamp_huge_elements() {
        let element = Element::text(-2e9, 0.0, 4e9, 50.0, "");
        let bounds = pixel_bounds(&element, Unit::Pixel, Resolution::SCREEN);
        assert_eq!(bounds.x, -2_000_000_000);
        assert_eq!(bounds.right(), i32::MAX);
        assert!(bounds.contains(10, 10));

        let far = Element::text(0.0, 0.0, 1e30, 1e30, "");
        let bounds = pixel_bounds(&far, Unit::Millimeter, Resolution::per_mm(10.0));
        assert_eq!((bounds.x, bounds.right()), (0, i32::MAX));
    }

    #[test]
    fn test_plan_binds_and_converts() {
        let layout = StickerLayout::sample_badge();
        let rec = record(&[("fullName", "Alex Johnson"), ("employeeId", "EMP-2024-889")]);
        let plan = plan(&layout, &rec, Resolution::per_mm(10.0)).unwrap();

        assert_eq!((plan.width, plan.height), (850, 540));
        assert_eq!(plan.background, Color::WHITE);
        assert_eq!(plan.elements.len(), 4);

        let name = &plan.elements[2];
        assert_eq!(name.bounds, PixelRect::new(50, 380, 750, 60));
        match &name.content {
            PlannedContent::Text(run) => {
                assert_eq!(run.lines, vec!["Alex Johnson"]);
                assert_eq!(run.h_align, HAlign::Center);
                assert!(run.bold);
            }
            other => panic!("expected text, got {:?}", other),
        }

        assert_eq!(
            plan.elements[1].content,
            PlannedContent::Qr {
                payload: "EMP-2024-889".into()
            }
        );
    }

    #[test]
    fn test_plan_missing_field_is_empty_text() {
        let layout = StickerLayout::sample_badge();
        let plan = plan(&layout, &DataRecord::new(), Resolution::SCREEN).unwrap();
        match &plan.elements[3].content {
            PlannedContent::Text(run) => assert_eq!(run.lines, vec![""]),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_rejects_degenerate_layout() {
        let mut layout = StickerLayout::sample_badge();
        layout.width = 0.0;
        assert!(matches!(
            plan(&layout, &DataRecord::new(), Resolution::SCREEN),
            Err(LayoutError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_plan_skips_unknown_kind() {
        let mut layout = StickerLayout::sample_badge();
        layout.elements[0].kind = ElementKind::Other("barcode".into());
        let plan = plan(&layout, &DataRecord::new(), Resolution::SCREEN).unwrap();
        assert_eq!(plan.elements[0].content, PlannedContent::Skipped);

        let program = plan.compile(|_| None);
        assert!(program.iter().all(|op| op.element_id() != Some("title")));
    }

    #[test]
    fn test_multiline_text() {
        let mut layout = StickerLayout::sample_badge();
        layout.elements[0].content = "LINE ONE\r\nLINE TWO".into();
        let plan = plan(&layout, &DataRecord::new(), Resolution::SCREEN).unwrap();
        match &plan.elements[0].content {
            PlannedContent::Text(run) => assert_eq!(run.lines, vec!["LINE ONE", "LINE TWO"]),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_font_size_scales_with_resolution() {
        let layout = StickerLayout::sample_badge();
        let plan = plan(&layout, &DataRecord::new(), Resolution::dpi(192.0)).unwrap();
        match &plan.elements[0].content {
            PlannedContent::Text(run) => assert!((run.pixel_height - 28.0).abs() < 1e-3),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_qr_payloads_dedup_and_skip_empty() {
        let mut layout = StickerLayout::new("L", "employee", 50.0, 50.0, Unit::Millimeter);
        layout.elements = vec![
            Element::qr(0.0, 0.0, 10.0, "{{id}}"),
            Element::qr(10.0, 0.0, 10.0, "{{id}}"),
            Element::qr(20.0, 0.0, 10.0, "{{missing}}"),
        ];
        let plan = plan(&layout, &record(&[("id", "X1")]), Resolution::SCREEN).unwrap();
        assert_eq!(plan.qr_payloads(), vec!["X1"]);
    }
}
