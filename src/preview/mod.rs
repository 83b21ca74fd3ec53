//! # Raster Backend
//!
//! Executes IR programs against a [`Surface`], an RGBA pixel buffer.
//!
//! ## Architecture
//!
//! ```text
//! Program (IR) → Rasterizer → Surface → PNG bytes
//!                     ↓
//!               Process each Op:
//!               - Clear: size the surface, fill background
//!               - Text: lay out lines, align, blit bitmap glyphs
//!               - Qr: scale modules uniformly into the bounds
//! ```
//!
//! Every element op is clipped to its own bounds (and to the surface), so
//! content never bleeds into neighboring elements.

mod font;

pub use font::{CellSize, Face, FontMetrics, GlyphCache, generate_glyph};

use image::{Rgba, RgbaImage};

use crate::error::LayoutError;
use crate::ir::{Op, PixelRect, Program, TextRun};
use crate::layout::{Color, HAlign, VAlign};
use crate::qr::QrSymbol;

/// Caller-owned raster surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// White surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, to_rgba(Color::WHITE)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width(), self.height())
    }

    /// Resize, discarding previous content.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width() != width || self.height() != height {
            self.image = RgbaImage::from_pixel(width, height, to_rgba(Color::WHITE));
        }
    }

    pub fn fill(&mut self, color: Color) {
        let px = to_rgba(color);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    /// Color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x, y);
        Some(Color { r, g, b, a })
    }

    /// Source-over blend one pixel. Coordinates outside the surface are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        if color.a == 255 {
            *dst = to_rgba(color);
            return;
        }
        let a = color.a as u32;
        let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
        let Rgba([dr, dg, db, da]) = *dst;
        *dst = Rgba([
            mix(color.r, dr),
            mix(color.g, dg),
            mix(color.b, db),
            (a + da as u32 * (255 - a) / 255) as u8,
        ]);
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        let clip = rect.intersect(&self.bounds());
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// One-pixel rectangle outline, used for designer overlays.
    ///
    /// Only the part of each edge that lies on the surface is visited.
    pub fn stroke_rect(&mut self, rect: PixelRect, color: Color) {
        let clip = rect.intersect(&self.bounds());
        if rect.is_empty() || clip.is_empty() {
            return;
        }
        let (last_x, last_y) = (rect.right() - 1, rect.bottom() - 1);
        for x in clip.x..clip.right() {
            self.blend_pixel(x, rect.y, color);
            if last_y != rect.y {
                self.blend_pixel(x, last_y, color);
            }
        }
        for y in clip.y..clip.bottom() {
            self.blend_pixel(rect.x, y, color);
            if last_x != rect.x {
                self.blend_pixel(last_x, y, color);
            }
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Count pixels inside `rect` that differ from `color`.
    pub fn count_not(&self, rect: PixelRect, color: Color) -> usize {
        let clip = rect.intersect(&self.bounds());
        let mut count = 0;
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                if self.pixel(x as u32, y as u32) != Some(color) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Convert to PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, LayoutError> {
        use image::ImageEncoder;

        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                self.image.as_raw(),
                self.width(),
                self.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e: image::ImageError| LayoutError::Image(e.to_string()))?;

        Ok(png_bytes)
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

/// Executes draw programs; keeps glyph bitmaps between runs.
#[derive(Debug, Default)]
pub struct Rasterizer {
    glyphs: GlyphCache,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute every op in order against `surface`.
    pub fn execute(&mut self, program: &Program, surface: &mut Surface) {
        for op in program {
            self.process_op(op, surface);
        }
    }

    fn process_op(&mut self, op: &Op, surface: &mut Surface) {
        match op {
            Op::Clear {
                width,
                height,
                background,
            } => {
                surface.resize(*width, *height);
                surface.fill(*background);
            }

            Op::Text { bounds, run, .. } => {
                self.render_text(surface, *bounds, run);
            }

            Op::Qr { bounds, symbol, .. } => {
                render_qr(surface, *bounds, symbol);
            }
        }
    }

    /// Draw a text block aligned within `bounds`, clipped to it.
    ///
    /// Offsets are computed in `i64`; only cells that touch the clip are visited.
    fn render_text(&mut self, surface: &mut Surface, bounds: PixelRect, run: &TextRun) {
        let clip = bounds.intersect(&surface.bounds());
        if clip.is_empty() || run.lines.is_empty() {
            return;
        }

        let cell = CellSize::for_height(run.pixel_height);
        let (cell_w, cell_h) = (cell.width as i64, cell.height as i64);
        let bold_offset = if run.bold { cell.bold_offset() as i64 } else { 0 };
        let (bx, by) = (i64::from(bounds.x), i64::from(bounds.y));
        let (bw, bh) = (i64::from(bounds.width), i64::from(bounds.height));
        let (clip_left, clip_right) = (i64::from(clip.x), i64::from(clip.right()));
        let (clip_top, clip_bottom) = (i64::from(clip.y), i64::from(clip.bottom()));

        let block_height = cell_h * run.lines.len() as i64;
        let top = by
            + match run.v_align {
                VAlign::Start => 0,
                VAlign::Middle => (bh - block_height) / 2,
                VAlign::End => bh - block_height,
            };

        for (line_idx, line) in run.lines.iter().enumerate() {
            let line_top = top + line_idx as i64 * cell_h;
            // Whole line outside the clip vertically
            if line_top >= clip_bottom || line_top + cell_h <= clip_top {
                continue;
            }

            let line_width = line.chars().count() as i64 * cell_w + bold_offset;
            let left = bx
                + match run.h_align {
                    HAlign::Start => 0,
                    HAlign::Center => (bw - line_width) / 2,
                    HAlign::End => bw - line_width,
                };

            for (char_idx, ch) in line.chars().enumerate() {
                let cell_left = left + char_idx as i64 * cell_w;
                if cell_left >= clip_right {
                    break;
                }
                if cell_left + cell_w + bold_offset <= clip_left {
                    continue;
                }
                let rows = (clip_top - line_top).max(0)..(clip_bottom - line_top).min(cell_h);
                let cols = (clip_left - cell_left - bold_offset).max(0)
                    ..(clip_right - cell_left).min(cell_w);
                for gy in rows {
                    let py = line_top + gy;
                    for gx in cols.clone() {
                        if !self.glyphs.ink_at(&cell, ch, gx as usize, gy as usize) {
                            continue;
                        }
                        let px = cell_left + gx;
                        for x in px.max(clip_left)..=(px + bold_offset).min(clip_right - 1) {
                            surface.blend_pixel(x as i32, py as i32, run.color);
                        }
                    }
                }
            }
        }
    }
}

/// Scale a QR symbol uniformly into the largest centered square in `bounds`.
///
/// Only pixels inside the visible part of the square are visited.
fn render_qr(surface: &mut Surface, bounds: PixelRect, symbol: &QrSymbol) {
    let side = bounds.width.min(bounds.height);
    if side == 0 {
        return;
    }
    let side = i64::from(side);
    let origin_x = i64::from(bounds.x) + (i64::from(bounds.width) - side) / 2;
    let origin_y = i64::from(bounds.y) + (i64::from(bounds.height) - side) / 2;
    let modules = symbol.width() as i64;
    let clip = bounds.intersect(&surface.bounds());

    for py in clip.y..clip.bottom() {
        let dy = i64::from(py) - origin_y;
        if dy < 0 || dy >= side {
            continue;
        }
        let my = (dy * modules / side) as usize;
        for px in clip.x..clip.right() {
            let dx = i64::from(px) - origin_x;
            if dx < 0 || dx >= side {
                continue;
            }
            let mx = (dx * modules / side) as usize;
            let color = if symbol.is_dark(mx, my) {
                Color::BLACK
            } else {
                Color::WHITE
            };
            surface.blend_pixel(px, py, color);
        }
    }
}

/// Execute a program with a throwaway rasterizer.
pub fn execute(program: &Program, surface: &mut Surface) {
    Rasterizer::new().execute(program, surface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::{QrCodeEncoder, QrEncoder};
    use std::sync::Arc;

    fn text_op(bounds: PixelRect, text: &str, h: HAlign, v: VAlign) -> Op {
        Op::Text {
            element_id: "t".into(),
            bounds,
            run: TextRun {
                lines: vec![text.into()],
                pixel_height: 24.0,
                bold: false,
                h_align: h,
                v_align: v,
                color: Color::BLACK,
            },
        }
    }

    fn clear(width: u32, height: u32) -> Op {
        Op::Clear {
            width,
            height,
            background: Color::WHITE,
        }
    }

    /// Leftmost and rightmost inked columns in the surface.
    fn ink_columns(surface: &Surface) -> Option<(u32, u32)> {
        let mut min = None;
        let mut max = None;
        for x in 0..surface.width() {
            for y in 0..surface.height() {
                if surface.pixel(x, y) != Some(Color::WHITE) {
                    min.get_or_insert(x);
                    max = Some(x);
                    break;
                }
            }
        }
        min.zip(max)
    }

    #[test]
    fn test_clear_resizes_and_fills() {
        let program: Program = [Op::Clear {
            width: 30,
            height: 10,
            background: Color::rgb(10, 20, 30),
        }]
        .into_iter()
        .collect();
        let mut surface = Surface::new(1, 1);
        execute(&program, &mut surface);
        assert_eq!(surface.width(), 30);
        assert_eq!(surface.pixel(29, 9), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_text_stays_in_bounds() {
        let bounds = PixelRect::new(20, 10, 60, 30);
        let program: Program = [
            clear(200, 100),
            text_op(bounds, "A VERY LONG LINE OF TEXT", HAlign::Start, VAlign::Start),
        ]
        .into_iter()
        .collect();
        let mut surface = Surface::new(1, 1);
        execute(&program, &mut surface);

        assert!(surface.count_not(bounds, Color::WHITE) > 0);
        let everything = surface.count_not(surface.bounds(), Color::WHITE);
        assert_eq!(everything, surface.count_not(bounds, Color::WHITE));
    }

    #[test]
    fn test_horizontal_alignment() {
        let bounds = PixelRect::new(0, 0, 200, 30);
        let mut columns = Vec::new();
        for align in [HAlign::Start, HAlign::Center, HAlign::End] {
            let program: Program = [clear(200, 30), text_op(bounds, "I", align, VAlign::Start)]
                .into_iter()
                .collect();
            let mut surface = Surface::new(1, 1);
            execute(&program, &mut surface);
            columns.push(ink_columns(&surface).unwrap());
        }
        assert!(columns[0].1 < 20);
        assert!(columns[1].0 > 80 && columns[1].1 < 120);
        assert!(columns[2].0 > 180);
    }

    #[test]
    fn test_vertical_alignment_end() {
        let bounds = PixelRect::new(0, 0, 100, 100);
        let program: Program = [clear(100, 100), text_op(bounds, "H", HAlign::Start, VAlign::End)]
            .into_iter()
            .collect();
        let mut surface = Surface::new(1, 1);
        execute(&program, &mut surface);
        assert_eq!(surface.count_not(PixelRect::new(0, 0, 100, 70), Color::WHITE), 0);
        assert!(surface.count_not(PixelRect::new(0, 76, 100, 24), Color::WHITE) > 0);
    }

    fn styled_run(text: &str, bold: bool, v_align: VAlign, color: Color) -> TextRun {
        TextRun {
            lines: vec![text.into()],
            pixel_height: 24.0,
            bold,
            h_align: HAlign::Start,
            v_align,
            color,
        }
    }

    fn draw_run(bounds: PixelRect, run: TextRun) -> Surface {
        let program: Program = [
            clear(bounds.width, bounds.height),
            Op::Text {
                element_id: "t".into(),
                bounds,
                run,
            },
        ]
        .into_iter()
        .collect();
        let mut surface = Surface::new(1, 1);
        execute(&program, &mut surface);
        surface
    }

    #[test]
    fn test_vertical_alignment_middle() {
        // A 24px cell in 100px is centered at rows 38..62.
        let bounds = PixelRect::new(0, 0, 100, 100);
        let surface = draw_run(bounds, styled_run("H", false, VAlign::Middle, Color::BLACK));
        assert_eq!(surface.count_not(PixelRect::new(0, 0, 100, 38), Color::WHITE), 0);
        assert_eq!(surface.count_not(PixelRect::new(0, 62, 100, 38), Color::WHITE), 0);
        assert!(surface.count_not(PixelRect::new(0, 38, 100, 24), Color::WHITE) > 0);
    }

    #[test]
    fn test_bold_adds_ink() {
        let bounds = PixelRect::new(0, 0, 200, 40);
        let normal = draw_run(bounds, styled_run("HELLO", false, VAlign::Start, Color::BLACK));
        let bold = draw_run(bounds, styled_run("HELLO", true, VAlign::Start, Color::BLACK));
        let normal_ink = normal.count_not(bounds, Color::WHITE);
        let bold_ink = bold.count_not(bounds, Color::WHITE);
        assert!(normal_ink > 0);
        assert!(bold_ink > normal_ink, "bold {} vs normal {}", bold_ink, normal_ink);
    }

    #[test]
    fn test_text_uses_run_color() {
        let gray = Color::rgb(0x66, 0x66, 0x66);
        let bounds = PixelRect::new(0, 0, 120, 30);
        let surface = draw_run(bounds, styled_run("HI", false, VAlign::Start, gray));
        let ink = surface.count_not(bounds, Color::WHITE);
        let not_gray = surface.count_not(bounds, gray);
        assert!(ink > 0);
        // Every pixel is either background or the run color.
        assert_eq!(ink + not_gray, (bounds.width * bounds.height) as usize);
    }

    #[test]
    fn test_huge_text_cell_is_clipped() {
        let bounds = PixelRect::new(0, 0, 50, 50);
        let mut run = styled_run("H", true, VAlign::Middle, Color::BLACK);
        run.pixel_height = 1e8;
        let surface = draw_run(bounds, run);
        assert_eq!((surface.width(), surface.height()), (50, 50));
    }

    #[test]
    fn test_qr_fills_square_and_centers() {
        let symbol = Arc::new(QrCodeEncoder::default().encode("hello").unwrap());
        let bounds = PixelRect::new(0, 0, 120, 60);
        let program: Program = [
            clear(120, 60),
            Op::Qr {
                element_id: "q".into(),
                bounds,
                symbol,
            },
        ]
        .into_iter()
        .collect();
        let mut surface = Surface::new(1, 1);
        execute(&program, &mut surface);

        // Square of 60px centered horizontally: columns 30..90.
        assert_eq!(surface.count_not(PixelRect::new(0, 0, 30, 60), Color::WHITE), 0);
        assert_eq!(surface.count_not(PixelRect::new(90, 0, 30, 60), Color::WHITE), 0);
        assert!(surface.count_not(PixelRect::new(30, 0, 60, 60), Color::WHITE) > 0);
    }

    #[test]
    fn test_blend_half_alpha() {
        let mut surface = Surface::new(1, 1);
        surface.blend_pixel(
            0,
            0,
            Color {
                r: 0,
                g: 0,
                b: 0,
                a: 128,
            },
        );
        let px = surface.pixel(0, 0).unwrap();
        assert!(px.r > 120 && px.r < 130);
        assert_eq!(px.a, 255);
    }

    #[test]
    fn test_to_png() {
        let surface = Surface::new(4, 4);
        let png = surface.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
