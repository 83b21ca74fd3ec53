//! Layout API handlers: render to PNG and validate.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::layout::{DataRecord, StickerLayout, schema::record_from_json};
use crate::units::Resolution;

use super::super::state::AppState;
use super::reject;

/// Request body for POST /api/render.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub layout: StickerLayout,
    /// Field values. Omitted means the target entity's sample data.
    #[serde(default)]
    pub record: Option<Value>,
    /// Pixels per millimetre. Omitted means the server default.
    #[serde(default)]
    pub dpmm: Option<f64>,
}

/// Handle POST /api/render - render a layout and record as PNG.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record: DataRecord = match &req.record {
        Some(value) => record_from_json(value).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "record must be a JSON object".to_string(),
            )
        })?,
        None => state
            .schemas
            .get(&req.layout.target_entity)
            .map(|s| s.sample_data.clone())
            .unwrap_or_default(),
    };

    let resolution = match req.dpmm {
        Some(dpmm) => {
            let resolution = Resolution::per_mm(dpmm);
            if !resolution.is_valid() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("dpmm must be positive, got {}", dpmm),
                ));
            }
            Some(resolution)
        }
        None => None,
    };

    let printer = state.printer_at(resolution);
    let png_bytes = printer
        .render_png(&req.layout, &record)
        .await
        .map_err(reject)?;
    debug!(layout_id = %req.layout.id, bytes = png_bytes.len(), "Rendered layout");

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// Response body for POST /api/validate.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle POST /api/validate - check a layout document without rendering it.
///
/// The body is taken as raw text so malformed JSON is reported the same way
/// as a structurally invalid layout.
pub async fn validate(State(state): State<Arc<AppState>>, body: String) -> Json<ValidateResponse> {
    let result = StickerLayout::from_json(&body).and_then(|layout| {
        layout.validate()?;
        crate::render::canvas_size(&layout, state.config.resolution)?;
        Ok(layout)
    });
    Json(match result {
        Ok(_) => ValidateResponse {
            valid: true,
            error: None,
        },
        Err(e) => ValidateResponse {
            valid: false,
            error: Some(e.to_string()),
        },
    })
}
