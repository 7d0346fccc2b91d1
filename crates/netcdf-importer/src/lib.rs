//! Importer for PINCAST radar composite NetCDF4 files.
//!
//! This crate reads the precipitation field produced by the PINCAST
//! radar-compositing pipeline, together with an optional quality field and
//! a metadata record (projection, extent, pixel size, institution and the
//! fixed unit conventions of the file family).
//!
//! The importer is registered in [`registry`] so a host can find it by name:
//!
//! ```ignore
//! use netcdf_importer::{find_importer, ImportOptions};
//!
//! let importer = find_importer("pincast_netcdf")?;
//! let field = importer.import(path, &ImportOptions::default())?;
//! ```
//!
//! # System requirements
//!
//! Requires libnetcdf and libhdf5 (`libhdf5-dev libnetcdf-dev`).

pub mod array;
pub mod dataset;
pub mod error;
pub mod importer;
pub mod metadata;
pub mod postprocess;
pub mod registry;

pub use ndarray;

pub use array::{squeeze_2d, RasterArray};
pub use dataset::{silence_hdf5_errors, PincastDataset};
pub use error::{ImportError, ImportResult};
pub use importer::{import_pincast_netcdf, ImportOptions, ImportedField};
pub use metadata::{coordinate_range, pixel_size, GridGeometry, Metadata};
pub use postprocess::{postprocess, ImportedPrecipitation, PostprocessOptions, Precision, PrecipitationArray};
pub use registry::{discover, find_importer, importer_methods, ImporterEntry, IMPORTER_GROUP};
