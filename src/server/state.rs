//! Server state and configuration.

use crate::layout::{SchemaMap, builtin_schemas};
use crate::render::StickerPrinter;
use crate::units::Resolution;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Resolution used when a render request doesn't name one
    pub resolution: Resolution,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            resolution: Resolution::default(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub schemas: SchemaMap,
    /// Default-resolution printer. Its QR cache is shared by every request.
    pub printer: StickerPrinter,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_schemas(config, builtin_schemas())
    }

    pub fn with_schemas(config: ServerConfig, schemas: SchemaMap) -> Self {
        let printer = StickerPrinter::new(config.resolution);
        Self {
            config,
            schemas,
            printer,
        }
    }

    /// Printer for a request, sharing the QR cache across resolutions.
    pub fn printer_at(&self, resolution: Option<Resolution>) -> StickerPrinter {
        match resolution {
            Some(resolution) => StickerPrinter::with_cache(resolution, self.printer.cache().clone()),
            None => self.printer.clone(),
        }
    }
}
