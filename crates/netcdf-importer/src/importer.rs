//! Import of PINCAST radar composites.
//!
//! Reads the precipitation field, an optional quality field and the grid
//! coordinates from a composite written by the radar composite generator,
//! and derives the metadata record the nowcasting host works with.
//!
//! # Missing CRS
//!
//! A composite without a usable CRS (no `spatial_ref` variable, no WKT
//! attribute, or WKT that cannot be turned into a PROJ definition with a
//! linear unit) still imports: `projection` and `cartesian_unit` are both
//! left unset. Every other failure aborts the import.

use std::path::Path;

use ndarray::Array2;
use projection::CrsSummary;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::array::RasterArray;
use crate::dataset::PincastDataset;
use crate::error::{ImportError, ImportResult};
use crate::metadata::{GridGeometry, Metadata, DEFAULT_PRECIP_FIELD, INSTITUTION_ATTR};
use crate::postprocess::PostprocessOptions;

/// Options of an import call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Variable holding the rain rate
    pub precip_field: String,
    /// Variable holding the quality index, not read when `None`
    pub quality_field: Option<String>,
    /// Applied by registered importers after the import itself
    #[serde(flatten)]
    pub postprocess: PostprocessOptions,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            precip_field: DEFAULT_PRECIP_FIELD.to_string(),
            quality_field: None,
            postprocess: PostprocessOptions::default(),
        }
    }
}

/// Arrays and metadata read from one composite.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedField {
    /// Rain rate in mm/h, `[rows, cols]`
    pub precipitation: Array2<f32>,
    /// Quality field in its stored type, same shape as `precipitation`
    pub quality: Option<RasterArray>,
    pub metadata: Metadata,
}

/// Import a PINCAST composite.
///
/// `options.postprocess` is not applied here; see
/// [`ImporterEntry::import`](crate::registry::ImporterEntry::import).
pub fn import_pincast_netcdf(filename: &Path, options: &ImportOptions) -> ImportResult<ImportedField> {
    let dataset = PincastDataset::open(filename)?;

    let precipitation = dataset.read_f32(&options.precip_field)?;

    let quality = match &options.quality_field {
        Some(name) => {
            let quality = dataset.read_native(name)?;
            if quality.shape() != precipitation.dim() {
                return Err(ImportError::Shape {
                    name: name.clone(),
                    reason: format!(
                        "quality shape {:?} differs from precipitation shape {:?}",
                        quality.shape(),
                        precipitation.dim()
                    ),
                });
            }
            Some(quality)
        }
        None => None,
    };

    let (projection, cartesian_unit) = match describe_crs(&dataset) {
        Some(summary) => (Some(summary.projection), Some(summary.cartesian_unit)),
        None => (None, None),
    };

    let institution = dataset.global_string_attr(INSTITUTION_ATTR);
    if institution.is_none() {
        debug!(path = %filename.display(), "No {} attribute", INSTITUTION_ATTR);
    }

    let x = dataset.coordinate("x")?;
    let y = dataset.coordinate("y")?;
    let geometry = GridGeometry::from_axes(&x, &y)?;

    let metadata = Metadata::new(geometry, projection, cartesian_unit, institution);

    info!(
        path = %filename.display(),
        variable = %options.precip_field,
        rows = precipitation.nrows(),
        cols = precipitation.ncols(),
        projection = metadata.projection.as_deref().unwrap_or("none"),
        "Imported PINCAST composite"
    );

    Ok(ImportedField {
        precipitation,
        quality,
        metadata,
    })
}

/// PROJ definition and unit of the file's CRS, or `None` with a warning.
fn describe_crs(dataset: &PincastDataset) -> Option<CrsSummary> {
    let Some(wkt) = dataset.crs_wkt() else {
        warn!(
            path = %dataset.path().display(),
            "No CRS WKT on spatial_ref; projection left unset"
        );
        return None;
    };

    match projection::summarize_wkt(&wkt) {
        Ok(summary) => {
            debug!(projection = %summary.projection, unit = %summary.cartesian_unit, "Resolved CRS");
            Some(summary)
        }
        Err(e) => {
            warn!(
                path = %dataset.path().display(),
                error = %e,
                "Unusable CRS; projection left unset"
            );
            None
        }
    }
}
