//! Standalone printing: one persisted layout plus one record → one image.

use std::sync::Arc;
use tracing::debug;

use super::plan::plan;
use crate::error::LayoutError;
use crate::ir::Program;
use crate::layout::{DataRecord, StickerLayout};
use crate::preview::{Rasterizer, Surface};
use crate::qr::QrCache;
use crate::units::Resolution;

/// Renders layouts at a fixed resolution, sharing a QR cache.
///
/// ```no_run
/// use qrlayout::layout::{DataRecord, StickerLayout};
/// use qrlayout::preview::Surface;
/// use qrlayout::render::StickerPrinter;
///
/// # async fn example() -> Result<(), qrlayout::LayoutError> {
/// let printer = StickerPrinter::default();
/// let layout = StickerLayout::sample_badge();
/// let mut record = DataRecord::new();
/// record.insert("fullName".into(), "Alex Johnson".into());
///
/// let mut surface = Surface::new(1, 1);
/// printer.render_to_canvas(&layout, &record, &mut surface).await?;
/// std::fs::write("badge.png", surface.to_png()?)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StickerPrinter {
    resolution: Resolution,
    cache: Arc<QrCache>,
}

impl StickerPrinter {
    /// Printer with its own QR cache.
    pub fn new(resolution: Resolution) -> Self {
        Self::with_cache(resolution, Arc::new(QrCache::new()))
    }

    /// Printer sharing an existing QR cache.
    pub fn with_cache(resolution: Resolution, cache: Arc<QrCache>) -> Self {
        Self { resolution, cache }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn cache(&self) -> &Arc<QrCache> {
        &self.cache
    }

    /// Compile a layout and record into a draw program.
    pub async fn compile(
        &self,
        layout: &StickerLayout,
        record: &DataRecord,
    ) -> Result<Program, LayoutError> {
        let plan = plan(layout, record, self.resolution)?;
        debug!(
            layout_id = %layout.id,
            width = plan.width,
            height = plan.height,
            elements = plan.elements.len(),
            "Planned layout"
        );
        Ok(plan.resolve(&self.cache).await)
    }

    /// Draw the finished label onto `surface`, resizing it to the label size.
    ///
    /// Nothing is written to the surface unless the layout is valid and every
    /// QR lookup has finished.
    pub async fn render_to_canvas(
        &self,
        layout: &StickerLayout,
        record: &DataRecord,
        surface: &mut Surface,
    ) -> Result<(), LayoutError> {
        let program = self.compile(layout, record).await?;
        Rasterizer::new().execute(&program, surface);
        Ok(())
    }

    /// Render to a new surface.
    pub async fn render(
        &self,
        layout: &StickerLayout,
        record: &DataRecord,
    ) -> Result<Surface, LayoutError> {
        let mut surface = Surface::new(1, 1);
        self.render_to_canvas(layout, record, &mut surface).await?;
        Ok(surface)
    }

    /// Render to PNG bytes.
    pub async fn render_png(
        &self,
        layout: &StickerLayout,
        record: &DataRecord,
    ) -> Result<Vec<u8>, LayoutError> {
        self.render(layout, record).await?.to_png()
    }
}

impl Default for StickerPrinter {
    fn default() -> Self {
        Self::new(Resolution::default())
    }
}
