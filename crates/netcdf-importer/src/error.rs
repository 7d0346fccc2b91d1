//! Error types for importing PINCAST composites.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for importer operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Error types for importing PINCAST composites.
///
/// Problems with the CRS descriptor or the institution attribute are not
/// errors; they leave the corresponding metadata fields unset.
#[derive(Error, Debug)]
pub enum ImportError {
    /// File missing or not readable as NetCDF
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    /// Requested data or coordinate variable not present
    #[error("Missing required variable: {0}")]
    MissingVariable(String),

    /// Variable present but its values could not be read
    #[error("Failed to read variable {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: netcdf::Error,
    },

    /// Coordinate variable unusable for deriving the grid geometry
    #[error("Invalid coordinate {name}: {reason}")]
    InvalidCoordinate { name: String, reason: String },

    /// Array is not a 2D raster, or does not match the precipitation raster
    #[error("Invalid shape for {name}: {reason}")]
    Shape { name: String, reason: String },

    /// Variable is not numeric
    #[error("Unsupported type for variable {name}: {vartype}")]
    UnsupportedType { name: String, vartype: String },

    /// Option value that cannot be interpreted
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// No importer registered under this name
    #[error("Unknown importer: {0}")]
    UnknownImporter(String),
}
