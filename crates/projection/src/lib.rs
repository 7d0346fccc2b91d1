//! Coordinate reference system parsing.
//!
//! Reads WKT (versions 1 and 2) CRS descriptions, as stored in the
//! `spatial_ref` variable of CF/GDAL-style NetCDF files, and renders them as
//! PROJ-style definition strings with their linear unit.
//!
//! The parser is implemented from scratch; `proj4rs` is only used to check
//! that a generated definition is one PROJ would accept.

pub mod crs;
pub mod error;
mod proj_string;
pub mod wkt;

pub use crs::{Crs, Datum, Ellipsoid, LinearUnit, Projection, ProjectionMethod};
pub use error::{CrsError, CrsResult};

/// PROJ definition and unit of a projected CRS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsSummary {
    /// PROJ-style definition, e.g. `+proj=stere +lat_0=90 ...`
    pub projection: String,
    /// PROJ unit id of the x/y axes, e.g. `km`
    pub cartesian_unit: String,
}

/// Convert a WKT CRS into its PROJ definition and cartesian unit.
///
/// Fails when the WKT cannot be parsed, uses an unsupported method, is
/// rejected by the PROJ parser, or has no named linear unit (geographic
/// CRSs included).
pub fn summarize_wkt(wkt: &str) -> CrsResult<CrsSummary> {
    let crs = Crs::from_wkt(wkt)?;
    let projection = crs.to_proj4()?;
    Crs::validate(&projection)?;

    let cartesian_unit = crs.linear_unit().ok_or(CrsError::NoLinearUnit)?;

    Ok(CrsSummary {
        projection,
        cartesian_unit: cartesian_unit.to_string(),
    })
}
