//! # Error Types
//!
//! This module defines error types used throughout the qrlayout library.
//!
//! Only structural problems are errors. A record that lacks a field binds to
//! an empty string, and a QR payload that fails to encode renders as blank
//! space; neither ever reaches a caller as `Err`.

use thiserror::Error;

/// Main error type for qrlayout operations
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Non-positive or non-finite width/height on a layout or element
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An element's geometry is not expressed in the layout's unit
    #[error("Unit mismatch: {0}")]
    UnitMismatch(String),

    /// Layout document could not be understood (bad color, bad field value)
    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    /// Operation referenced an element id that is not in the layout
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// No schema is registered for the requested entity type
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    /// QR encoder failure
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
