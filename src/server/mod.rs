//! # HTTP Server for Layout Rendering
//!
//! Renders stored layouts against records over HTTP, for applications that
//! keep their layouts and records elsewhere.
//!
//! ## Usage
//!
//! ```bash
//! qrlayout serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/api/schemas` | | schemas keyed by entity type |
//! | POST | `/api/render` | `{layout, record?, dpmm?}` | `image/png` |
//! | POST | `/api/validate` | layout JSON | `{valid, error?}` |

mod handlers;
mod state;

pub use handlers::layout::{RenderRequest, ValidateResponse};
pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::LayoutError;

/// Build the router. Exposed separately from [`serve`] for tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/schemas", get(handlers::schemas::list))
        .route("/api/render", post(handlers::layout::render))
        .route("/api/validate", post(handlers::layout::validate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use qrlayout::server::{serve, ServerConfig};
/// use qrlayout::units::Resolution;
///
/// # async fn example() -> Result<(), qrlayout::LayoutError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     resolution: Resolution::PRINT_300,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), LayoutError> {
    let app_state = Arc::new(AppState::new(config.clone()));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(
        listen_addr = %config.listen_addr,
        dpi = config.resolution.px_per_inch(),
        "qrlayout HTTP server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
