//! Post-processing applied to every imported field before it reaches the caller.
//!
//! Converts the precipitation array to the requested precision and
//! optionally replaces non-finite values. Quality and metadata pass through.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::array::RasterArray;
use crate::error::ImportError;
use crate::importer::ImportedField;
use crate::metadata::Metadata;

/// Floating-point precision of the returned precipitation array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[serde(alias = "float32")]
    Single,
    #[default]
    #[serde(alias = "float64")]
    Double,
}

impl FromStr for Precision {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "float32" => Ok(Precision::Single),
            "double" | "float64" => Ok(Precision::Double),
            _ => Err(ImportError::InvalidOption(format!(
                "dtype must be 'single' or 'double', got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => write!(f, "single"),
            Precision::Double => write!(f, "double"),
        }
    }
}

/// Options of the post-processing step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessOptions {
    /// Replacement for NaN and infinite precipitation values; `None` keeps them
    pub fillna: Option<f64>,
    pub dtype: Precision,
}

/// Precipitation array at its final precision.
#[derive(Debug, Clone, PartialEq)]
pub enum PrecipitationArray {
    Single(Array2<f32>),
    Double(Array2<f64>),
}

impl PrecipitationArray {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            PrecipitationArray::Single(array) => array.dim(),
            PrecipitationArray::Double(array) => array.dim(),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            PrecipitationArray::Single(_) => "float32",
            PrecipitationArray::Double(_) => "float64",
        }
    }

    /// `(min, max)` over the finite values, `None` if there are none.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        let values: Box<dyn Iterator<Item = f64> + '_> = match self {
            PrecipitationArray::Single(array) => Box::new(array.iter().map(|&v| f64::from(v))),
            PrecipitationArray::Double(array) => Box::new(array.iter().copied()),
        };
        values
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }
}

/// A field as handed to the caller of a registered importer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPrecipitation {
    pub precipitation: PrecipitationArray,
    pub quality: Option<RasterArray>,
    pub metadata: Metadata,
}

/// Cast precipitation to `options.dtype`, then fill non-finite values.
pub fn postprocess(field: ImportedField, options: &PostprocessOptions) -> ImportedPrecipitation {
    let ImportedField {
        precipitation,
        quality,
        metadata,
    } = field;

    let precipitation = match options.dtype {
        Precision::Single => {
            let mut array = precipitation;
            if let Some(fill) = options.fillna {
                let fill = fill as f32;
                array.mapv_inplace(|v| if v.is_finite() { v } else { fill });
            }
            PrecipitationArray::Single(array)
        }
        Precision::Double => {
            let mut array = precipitation.mapv(f64::from);
            if let Some(fill) = options.fillna {
                array.mapv_inplace(|v| if v.is_finite() { v } else { fill });
            }
            PrecipitationArray::Double(array)
        }
    };

    ImportedPrecipitation {
        precipitation,
        quality,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::GridGeometry;
    use ndarray::array;

    fn field_with_gaps() -> ImportedField {
        let geometry = GridGeometry::from_axes(&[0.0, 1.0], &[1.0, 0.0]).unwrap();
        ImportedField {
            precipitation: array![[0.5, f32::NAN], [f32::INFINITY, 2.0]],
            quality: None,
            metadata: Metadata::new(geometry, None, None, None),
        }
    }

    #[test]
    fn test_default_is_double_without_fill() {
        let result = postprocess(field_with_gaps(), &PostprocessOptions::default());
        match result.precipitation {
            PrecipitationArray::Double(array) => {
                assert_eq!(array[[0, 0]], 0.5);
                assert!(array[[0, 1]].is_nan());
                assert!(array[[1, 0]].is_infinite());
            }
            other => panic!("expected double precision, got {}", other.dtype()),
        }
    }

    #[test]
    fn test_fillna_single() {
        let options = PostprocessOptions {
            fillna: Some(0.0),
            dtype: Precision::Single,
        };
        let result = postprocess(field_with_gaps(), &options);
        assert_eq!(
            result.precipitation,
            PrecipitationArray::Single(array![[0.5, 0.0], [0.0, 2.0]])
        );
    }

    #[test]
    fn test_fillna_double() {
        let options = PostprocessOptions {
            fillna: Some(-1.0),
            dtype: Precision::Double,
        };
        let result = postprocess(field_with_gaps(), &options);
        assert_eq!(result.precipitation.finite_range(), Some((-1.0, 2.0)));
        assert_eq!(result.precipitation.shape(), (2, 2));
    }

    #[test]
    fn test_finite_range_all_nan() {
        let array = PrecipitationArray::Single(Array2::from_elem((2, 2), f32::NAN));
        assert_eq!(array.finite_range(), None);
    }

    #[test]
    fn test_precision_parsing() {
        assert_eq!("single".parse::<Precision>().unwrap(), Precision::Single);
        assert_eq!("float32".parse::<Precision>().unwrap(), Precision::Single);
        assert_eq!("DOUBLE".parse::<Precision>().unwrap(), Precision::Double);
        assert_eq!("float64".parse::<Precision>().unwrap(), Precision::Double);
        assert!("half".parse::<Precision>().is_err());
        assert_eq!(Precision::Single.to_string(), "single");
    }

    #[test]
    fn test_options_from_yaml() {
        let options: PostprocessOptions = serde_yaml::from_str("dtype: float32\nfillna: 0").unwrap();
        assert_eq!(options.dtype, Precision::Single);
        assert_eq!(options.fillna, Some(0.0));

        let options: PostprocessOptions = serde_yaml::from_str("{}").unwrap();
        assert_eq!(options, PostprocessOptions::default());
    }
}
