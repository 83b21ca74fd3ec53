//! HTTP handlers for the server.

pub mod layout;
pub mod schemas;

use axum::http::StatusCode;

use crate::error::LayoutError;

/// Map a library error onto a status code and message.
pub(crate) fn reject(e: LayoutError) -> (StatusCode, String) {
    let status = match e {
        LayoutError::InvalidGeometry(_)
        | LayoutError::UnitMismatch(_)
        | LayoutError::MalformedLayout(_)
        | LayoutError::UnknownElement(_)
        | LayoutError::UnknownEntity(_)
        | LayoutError::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
