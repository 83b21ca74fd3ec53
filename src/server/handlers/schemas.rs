//! Schema API handlers.

use axum::{Json, extract::State};
use std::sync::Arc;

use crate::layout::SchemaMap;

use super::super::state::AppState;

/// GET /api/schemas - List entity schemas keyed by entity type.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<SchemaMap> {
    Json(state.schemas.clone())
}
