//! JSON report printed for an imported composite.

use std::path::Path;

use netcdf_importer::{ImportedPrecipitation, Metadata};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub file: String,
    pub importer: String,
    pub metadata: Metadata,
    pub precipitation: ArraySummary,
    pub quality: Option<ArraySummary>,
}

/// Shape and type of an array, with the finite value range for precipitation.
#[derive(Debug, Serialize)]
pub struct ArraySummary {
    pub shape: [usize; 2],
    pub dtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ImportReport {
    pub fn new(file: &Path, importer: &str, imported: ImportedPrecipitation) -> Self {
        let (rows, cols) = imported.precipitation.shape();
        let range = imported.precipitation.finite_range();

        let quality = imported.quality.as_ref().map(|quality| {
            let (rows, cols) = quality.shape();
            ArraySummary {
                shape: [rows, cols],
                dtype: quality.dtype().to_string(),
                min: None,
                max: None,
            }
        });

        Self {
            file: file.display().to_string(),
            importer: importer.to_string(),
            metadata: imported.metadata,
            precipitation: ArraySummary {
                shape: [rows, cols],
                dtype: imported.precipitation.dtype().to_string(),
                min: range.map(|(min, _)| min),
                max: range.map(|(_, max)| max),
            },
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_importer::ndarray::Array2;
    use netcdf_importer::{GridGeometry, PrecipitationArray, RasterArray};
    use std::path::PathBuf;

    fn imported(quality: Option<RasterArray>) -> ImportedPrecipitation {
        let geometry = GridGeometry::from_axes(&[0.0, 1.0, 2.0], &[1.0, 0.0]).unwrap();
        let mut precipitation = Array2::<f64>::zeros((2, 3));
        precipitation[[1, 2]] = 4.5;
        precipitation[[0, 0]] = f64::NAN;

        ImportedPrecipitation {
            precipitation: PrecipitationArray::Double(precipitation),
            quality,
            metadata: Metadata::new(geometry, None, None, Some("FMI".to_string())),
        }
    }

    #[test]
    fn test_report_json() {
        let report = ImportReport::new(
            &PathBuf::from("/data/composite.nc"),
            "importer_pincast_netcdf",
            imported(None),
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["file"], "/data/composite.nc");
        assert_eq!(json["precipitation"]["shape"], serde_json::json!([2, 3]));
        assert_eq!(json["precipitation"]["dtype"], "float64");
        assert_eq!(json["precipitation"]["min"], 0.0);
        assert_eq!(json["precipitation"]["max"], 4.5);
        assert!(json["quality"].is_null());
        assert_eq!(json["metadata"]["institution"], "FMI");
        assert_eq!(json["metadata"]["xpixelsize"], 1.0);
    }

    #[test]
    fn test_report_quality_summary() {
        let quality = RasterArray::U8(Array2::zeros((2, 3)));
        let report = ImportReport::new(&PathBuf::from("a.nc"), "pincast_netcdf", imported(Some(quality)));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["quality"]["dtype"], "uint8");
        assert!(json["quality"].get("min").is_none());
    }
}
