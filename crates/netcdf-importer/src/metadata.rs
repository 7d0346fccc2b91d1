//! Metadata record attached to an imported composite.
//!
//! Field names are those the nowcasting host expects, so the record
//! serializes to the same keys it uses internally.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ImportError, ImportResult};

/// Unit of the precipitation field
pub const PRECIP_UNIT: &str = "mm/h";

/// First row of the raster is the northernmost one
pub const Y_ORIGIN: &str = "upper";

/// Value representing no rain
pub const ZERO_VALUE: f64 = 0.0;

/// Global attribute holding the producing institution
pub const INSTITUTION_ATTR: &str = "nc.institution";

/// Variable read when the caller names none
pub const DEFAULT_PRECIP_FIELD: &str = "RATE";

/// Metadata of an imported precipitation field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// PROJ-style definition of the grid CRS
    pub projection: Option<String>,
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub xpixelsize: f64,
    pub ypixelsize: f64,
    /// PROJ unit id of the x/y coordinates
    pub cartesian_unit: Option<String>,
    pub yorigin: String,
    pub institution: Option<String>,
    pub unit: String,
    /// Always unset: values are plain rain rates
    pub transform: Option<String>,
    pub threshold: Option<f64>,
    pub zerovalue: f64,
}

impl Metadata {
    /// Assemble the record; everything not passed in is fixed for PINCAST files.
    pub fn new(
        geometry: GridGeometry,
        projection: Option<String>,
        cartesian_unit: Option<String>,
        institution: Option<String>,
    ) -> Self {
        Self {
            projection,
            x1: geometry.x1,
            x2: geometry.x2,
            y1: geometry.y1,
            y2: geometry.y2,
            xpixelsize: geometry.xpixelsize,
            ypixelsize: geometry.ypixelsize,
            cartesian_unit,
            yorigin: Y_ORIGIN.to_string(),
            institution,
            unit: PRECIP_UNIT.to_string(),
            transform: None,
            threshold: None,
            zerovalue: ZERO_VALUE,
        }
    }
}

/// Extent and pixel size derived from the `x` and `y` coordinate arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub xpixelsize: f64,
    pub ypixelsize: f64,
}

impl GridGeometry {
    pub fn from_axes(x: &[f64], y: &[f64]) -> ImportResult<Self> {
        let (x1, x2, xpixelsize) = axis_geometry("x", x)?;
        let (y1, y2, ypixelsize) = axis_geometry("y", y)?;
        Ok(Self {
            x1,
            x2,
            y1,
            y2,
            xpixelsize,
            ypixelsize,
        })
    }
}

fn axis_geometry(name: &str, coords: &[f64]) -> ImportResult<(f64, f64, f64)> {
    let invalid = |reason: &str| ImportError::InvalidCoordinate {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let step = pixel_size(coords).ok_or_else(|| invalid("fewer than two values"))?;
    let (min, max) = coordinate_range(coords).ok_or_else(|| invalid("no finite values"))?;

    if cfg!(debug_assertions) && !is_uniform(coords, step) {
        warn!(
            axis = name,
            step = step,
            "Coordinate spacing is not uniform; pixel size taken from the first step"
        );
    }

    Ok((min, max, step))
}

/// Pixel size along an axis: the first successive difference.
///
/// The sign follows the axis direction, so a north-up `y` axis gives a
/// negative size. Spacing is assumed uniform and not checked here.
pub fn pixel_size(coords: &[f64]) -> Option<f64> {
    match coords {
        [first, second, ..] => Some(second - first),
        _ => None,
    }
}

/// `(min, max)` of the coordinate values, ignoring NaN.
pub fn coordinate_range(coords: &[f64]) -> Option<(f64, f64)> {
    coords
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

fn is_uniform(coords: &[f64], step: f64) -> bool {
    let tolerance = step.abs() * 1e-6;
    coords
        .windows(2)
        .all(|pair| ((pair[1] - pair[0]) - step).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_pixel_size_follows_direction() {
        assert_eq!(pixel_size(&[0.0, 1.0, 2.0]), Some(1.0));
        assert_eq!(pixel_size(&[99.0, 98.0, 97.0]), Some(-1.0));
        assert_eq!(pixel_size(&[5.0]), None);
        assert_eq!(pixel_size(&[]), None);
    }

    #[test]
    fn test_pixel_size_uses_first_step_only() {
        assert_eq!(pixel_size(&[0.0, 2.0, 3.0, 10.0]), Some(2.0));
    }

    #[test]
    fn test_coordinate_range() {
        assert_eq!(coordinate_range(&[3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(coordinate_range(&[f64::NAN, 2.0, 1.0]), Some((1.0, 2.0)));
        assert_eq!(coordinate_range(&[f64::NAN]), None);
    }

    #[test]
    fn test_geometry_descending_y() {
        let x: Vec<f64> = (0..100).map(f64::from).collect();
        let y: Vec<f64> = (0..100).rev().map(f64::from).collect();

        let geometry = GridGeometry::from_axes(&x, &y).unwrap();
        assert_eq!(geometry.x1, 0.0);
        assert_eq!(geometry.x2, 99.0);
        assert_eq!(geometry.y1, 0.0);
        assert_eq!(geometry.y2, 99.0);
        assert_eq!(geometry.xpixelsize, 1.0);
        assert_eq!(geometry.ypixelsize, -1.0);
    }

    #[test]
    fn test_geometry_rejects_single_value_axis() {
        let err = GridGeometry::from_axes(&[0.0, 1.0], &[4.0]).unwrap_err();
        match err {
            ImportError::InvalidCoordinate { name, .. } => assert_eq!(name, "y"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_is_uniform() {
        assert!(is_uniform(&[0.0, 0.5, 1.0, 1.5], 0.5));
        assert!(!is_uniform(&[0.0, 0.5, 2.0], 0.5));
    }

    #[test]
    fn test_metadata_constants() {
        let geometry = GridGeometry::from_axes(&[0.0, 500.0], &[1000.0, 500.0]).unwrap();
        let metadata = Metadata::new(geometry, None, None, Some("FMI".to_string()));

        assert_eq!(metadata.unit, "mm/h");
        assert_eq!(metadata.yorigin, "upper");
        assert_eq!(metadata.zerovalue, 0.0);
        assert_eq!(metadata.transform, None);
        assert_eq!(metadata.threshold, None);
        assert_approx_eq!(metadata.ypixelsize, -500.0, 1e-12);
    }

    #[test]
    fn test_metadata_serializes_null_fields() {
        let geometry = GridGeometry::from_axes(&[0.0, 1.0], &[1.0, 0.0]).unwrap();
        let metadata = Metadata::new(geometry, None, None, None);
        let json = serde_json::to_value(&metadata).unwrap();

        assert!(json["projection"].is_null());
        assert!(json["cartesian_unit"].is_null());
        assert!(json["institution"].is_null());
        assert!(json["transform"].is_null());
        assert!(json["threshold"].is_null());
        assert_eq!(json["zerovalue"], 0.0);
        assert_eq!(json["unit"], "mm/h");
    }
}
