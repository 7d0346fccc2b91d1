//! Error types for CRS parsing and conversion.

use thiserror::Error;

/// Result type for CRS operations.
pub type CrsResult<T> = Result<T, CrsError>;

/// Error types for CRS parsing and conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrsError {
    /// Blank WKT input
    #[error("Empty WKT string")]
    Empty,

    /// Malformed WKT text
    #[error("Invalid WKT at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Root node is not a horizontal projected or geographic CRS
    #[error("Unsupported CRS type: {0}")]
    UnsupportedCrsType(String),

    /// Projection method with no PROJ equivalent here
    #[error("Unsupported projection method: {0}")]
    UnsupportedMethod(String),

    /// Required node or value absent from the WKT tree
    #[error("Missing CRS component: {0}")]
    MissingComponent(String),

    /// CRS carries no named linear unit
    #[error("CRS has no named linear unit")]
    NoLinearUnit,

    /// Generated definition was refused by the PROJ parser
    #[error("PROJ definition rejected: {0}")]
    Rejected(String),
}

impl CrsError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        CrsError::Syntax {
            offset,
            message: message.into(),
        }
    }
}
