//! # QR Encoding and Cache
//!
//! Turns a text payload into a [`QrSymbol`] (a square grid of dark/light
//! modules including the quiet zone) and memoizes the result.
//!
//! ## Cache lifecycle
//!
//! A [`QrCache`] is created by whoever owns rendering (usually once per
//! process) and passed explicitly to printers and designer sessions. Entries
//! are never evicted; [`QrCache::clear`] is the only reset.
//!
//! Each key maps to a shared once-cell, so concurrent first requests for the
//! same text wait on a single encode instead of racing. Encoding runs on the
//! blocking pool; dropping the caller's future abandons its result.
//!
//! ## Failures
//!
//! An encoder error is logged and returned as `None`. Failed payloads are
//! not cached, so a later request tries again.

use base64::Engine;
use qrcode::{EcLevel, QrCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use image::{GrayImage, Luma};

use crate::error::LayoutError;

/// Encoded QR symbol, one entry per module, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSymbol {
    width: usize,
    modules: Vec<bool>,
}

impl QrSymbol {
    /// Build from a row-major module grid. `modules.len()` must be `width²`.
    pub fn from_modules(width: usize, modules: Vec<bool>) -> Result<Self, LayoutError> {
        if width == 0 || modules.len() != width * width {
            return Err(LayoutError::Encoding(format!(
                "module grid of {} cells is not {}x{}",
                modules.len(),
                width,
                width
            )));
        }
        Ok(Self { width, modules })
    }

    /// Modules per side, quiet zone included.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// One pixel per module, black on white.
    pub fn to_image(&self) -> GrayImage {
        let side = self.width as u32;
        GrayImage::from_fn(side, side, |x, y| {
            if self.is_dark(x as usize, y as usize) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    pub fn to_png(&self) -> Result<Vec<u8>, LayoutError> {
        use image::ImageEncoder;

        let img = self.to_image();
        let mut png_bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png_bytes)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::L8,
            )
            .map_err(|e| LayoutError::Image(e.to_string()))?;
        Ok(png_bytes)
    }

    /// `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> Result<String, LayoutError> {
        let png = self.to_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

/// Something that can turn text into a QR symbol.
///
/// Implementations must be deterministic: the same text always yields the
/// same modules.
pub trait QrEncoder: Send + Sync + 'static {
    fn encode(&self, text: &str) -> Result<QrSymbol, LayoutError>;
}

/// Default encoder backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeEncoder {
    pub ec_level: EcLevel,
    /// Light modules added on each side.
    pub quiet_zone: usize,
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::M,
            quiet_zone: 4,
        }
    }
}

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, text: &str) -> Result<QrSymbol, LayoutError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), self.ec_level)
            .map_err(|e| LayoutError::Encoding(format!("QR code generation failed: {}", e)))?;

        let inner = code.width();
        let colors = code.to_colors();
        let width = inner + self.quiet_zone * 2;
        let mut modules = vec![false; width * width];
        for (i, color) in colors.iter().enumerate() {
            if *color == qrcode::Color::Dark {
                let x = i % inner + self.quiet_zone;
                let y = i / inner + self.quiet_zone;
                modules[y * width + x] = true;
            }
        }
        QrSymbol::from_modules(width, modules)
    }
}

type Slot = Arc<OnceCell<Arc<QrSymbol>>>;

/// Process-lifetime memo of encoded symbols keyed by exact payload text.
pub struct QrCache {
    encoder: Arc<dyn QrEncoder>,
    entries: Mutex<HashMap<String, Slot>>,
}

impl QrCache {
    /// Cache backed by the default [`QrCodeEncoder`].
    pub fn new() -> Self {
        Self::with_encoder(Arc::new(QrCodeEncoder::default()))
    }

    pub fn with_encoder(encoder: Arc<dyn QrEncoder>) -> Self {
        Self {
            encoder,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the symbol for `text`, encoding it at most once.
    ///
    /// Returns `None` if encoding failed; the failure has been logged.
    pub async fn get(&self, text: &str) -> Option<Arc<QrSymbol>> {
        let slot = {
            let mut entries = self.entries.lock().await;
            entries.entry(text.to_string()).or_default().clone()
        };

        if let Some(symbol) = slot.get() {
            debug!(payload = %text, "QR cache hit");
            return Some(symbol.clone());
        }

        let encoder = self.encoder.clone();
        let payload = text.to_string();
        let result = slot
            .get_or_try_init(|| async move {
                debug!(payload = %payload, "QR cache miss, encoding");
                match tokio::task::spawn_blocking(move || encoder.encode(&payload)).await {
                    Ok(encoded) => encoded.map(Arc::new),
                    Err(e) => Err(LayoutError::Encoding(format!("encoder task failed: {}", e))),
                }
            })
            .await;

        match result {
            Ok(symbol) => Some(symbol.clone()),
            Err(e) => {
                warn!(payload = %text, error = %e, "QR encoding failed, leaving element blank");
                let mut entries = self.entries.lock().await;
                if entries
                    .get(text)
                    .is_some_and(|s| Arc::ptr_eq(s, &slot) && !s.initialized())
                {
                    entries.remove(text);
                }
                None
            }
        }
    }

    /// Already-encoded symbol, without triggering an encode.
    pub async fn peek(&self, text: &str) -> Option<Arc<QrSymbol>> {
        let entries = self.entries.lock().await;
        entries.get(text).and_then(|slot| slot.get().cloned())
    }

    /// Number of successfully encoded payloads.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for QrCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QrCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrCache").finish_non_exhaustive()
    }
}
