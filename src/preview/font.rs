//! Font metrics and glyph generation for label text.
//!
//! Uses the Spleen bitmap font family. Each requested pixel height is served
//! by the largest face that fits, scaled with nearest neighbor.

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};
use std::collections::HashMap;

/// Bundled Spleen faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Small,
    Medium,
    Large,
}

/// Font dimensions for each face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: usize,
    pub char_height: usize,
}

impl FontMetrics {
    pub const SMALL: FontMetrics = FontMetrics {
        char_width: 6,
        char_height: 12,
    };

    pub const MEDIUM: FontMetrics = FontMetrics {
        char_width: 8,
        char_height: 16,
    };

    pub const LARGE: FontMetrics = FontMetrics {
        char_width: 12,
        char_height: 24,
    };

    pub fn for_face(face: Face) -> FontMetrics {
        match face {
            Face::Small => Self::SMALL,
            Face::Medium => Self::MEDIUM,
            Face::Large => Self::LARGE,
        }
    }
}

impl Face {
    /// Largest face not taller than `pixel_height`, or the smallest face.
    pub fn for_height(pixel_height: f32) -> Face {
        [Face::Large, Face::Medium, Face::Small]
            .into_iter()
            .find(|f| FontMetrics::for_face(*f).char_height as f32 <= pixel_height)
            .unwrap_or(Face::Small)
    }
}

/// Tallest glyph cell drawn. Larger text is clipped by its bounds anyway.
pub const MAX_CELL_HEIGHT: f32 = 1_000_000.0;

/// Scaled glyph cell size for a face at a pixel height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub face: Face,
    pub width: usize,
    pub height: usize,
    pub scale: f32,
}

impl CellSize {
    pub fn for_height(pixel_height: f32) -> CellSize {
        let pixel_height = pixel_height.max(1.0).min(MAX_CELL_HEIGHT);
        let face = Face::for_height(pixel_height);
        let metrics = FontMetrics::for_face(face);
        let scale = pixel_height / metrics.char_height as f32;
        CellSize {
            face,
            width: ((metrics.char_width as f32 * scale).round() as usize).max(1),
            height: (pixel_height.round() as usize).max(1),
            scale,
        }
    }

    /// Horizontal smear applied for bold text.
    pub fn bold_offset(&self) -> usize {
        (self.scale.floor() as usize).max(1)
    }
}

/// Generate a glyph bitmap for a character.
/// Returns a Vec<bool> of `char_width * char_height` with true = ink.
pub fn generate_glyph(face: Face, ch: char) -> Vec<bool> {
    let metrics = FontMetrics::for_face(face);
    let mut glyph = vec![false; metrics.char_width * metrics.char_height];

    let data = match face {
        Face::Small => FONT_6X12,
        Face::Medium => FONT_8X16,
        Face::Large => FONT_12X24,
    };

    let Ok(mut spleen) = PSF2Font::new(data) else {
        draw_box(&mut glyph, metrics.char_width, metrics.char_height);
        return glyph;
    };

    let utf8_bytes = ch.to_string();
    match spleen.glyph_for_utf8(utf8_bytes.as_bytes()) {
        Some(spleen_glyph) => {
            for (row_y, row) in spleen_glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < metrics.char_height && col_x < metrics.char_width {
                        glyph[row_y * metrics.char_width + col_x] = on;
                    }
                }
            }
        }
        None => {
            // Fallback: draw a box for unknown chars
            draw_box(&mut glyph, metrics.char_width, metrics.char_height);
        }
    }

    glyph
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [bool], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = true;
        glyph[(height - 1) * width + x] = true;
    }
    for y in 0..height {
        glyph[y * width] = true;
        glyph[y * width + width - 1] = true;
    }
}

/// Memo of native-resolution glyph bitmaps.
#[derive(Debug, Default)]
pub struct GlyphCache {
    glyphs: HashMap<(Face, char), Vec<bool>>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn glyph(&mut self, face: Face, ch: char) -> &[bool] {
        self.glyphs
            .entry((face, ch))
            .or_insert_with(|| generate_glyph(face, ch))
    }

    /// Whether the scaled glyph has ink at cell-local `(x, y)`.
    pub fn ink_at(&mut self, cell: &CellSize, ch: char, x: usize, y: usize) -> bool {
        let metrics = FontMetrics::for_face(cell.face);
        let sx = x * metrics.char_width / cell.width;
        let sy = y * metrics.char_height / cell.height;
        if sx >= metrics.char_width || sy >= metrics.char_height {
            return false;
        }
        self.glyph(cell.face, ch)[sy * metrics.char_width + sx]
    }
}
