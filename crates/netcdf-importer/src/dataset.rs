//! Read access to a PINCAST composite through the native netcdf library.
//!
//! A composite holds the rain rate over `(time, y, x)`, 1D `x` and `y`
//! coordinate variables, a `spatial_ref` grid-mapping variable whose
//! attributes carry the CRS as WKT, and free-form global attributes.
//!
//! Values are decoded the CF way when read as floating point: cells equal
//! to `_FillValue` or `missing_value` become NaN, then `scale_factor` and
//! `add_offset` are applied. [`PincastDataset::read_native`] skips decoding
//! and keeps the stored type.

use std::path::{Path, PathBuf};
use std::sync::Once;

use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use ndarray::Array2;
use tracing::debug;

use crate::array::{squeeze_2d, RasterArray};
use crate::error::{ImportError, ImportResult};

/// Grid-mapping variable carrying the CRS
pub const SPATIAL_REF_VAR: &str = "spatial_ref";

/// Attributes of the grid-mapping variable that may hold the WKT, in lookup order
const CRS_WKT_ATTRS: &[&str] = &["crs_wkt", "spatial_ref"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// It only needs to be called once per process, but is safe to call multiple times.
/// [`PincastDataset::open`] calls it; binaries should call it early in `main()`
/// so it takes effect before HDF5 initializes.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open composite file. The underlying handle is closed on drop.
pub struct PincastDataset {
    path: PathBuf,
    file: netcdf::File,
}

impl PincastDataset {
    /// Open a composite read-only.
    pub fn open(path: &Path) -> ImportResult<Self> {
        silence_hdf5_errors();

        let file = netcdf::open(path).map_err(|source| ImportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened NetCDF file");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a variable as f32 with CF decoding, squeezed to 2D.
    pub fn read_f32(&self, name: &str) -> ImportResult<Array2<f32>> {
        let var = self.numeric_variable(name)?;
        let shape = dimension_lengths(&var);
        let values = read_decoded(&var, name)?;
        let values: Vec<f32> = values.into_iter().map(|v| v as f32).collect();

        debug!(variable = name, shape = ?shape, "Read variable as f32");
        squeeze_2d(name, &shape, values)
    }

    /// Read a variable in its stored numeric type, without decoding, squeezed to 2D.
    pub fn read_native(&self, name: &str) -> ImportResult<RasterArray> {
        let var = self.numeric_variable(name)?;
        let shape = dimension_lengths(&var);

        macro_rules! read_as {
            ($ty:ty, $variant:ident) => {{
                let values: Vec<$ty> = var.get_values(..).map_err(|source| ImportError::Read {
                    name: name.to_string(),
                    source,
                })?;
                RasterArray::$variant(squeeze_2d(name, &shape, values)?)
            }};
        }

        let array = match var.vartype() {
            NcVariableType::Int(IntType::I8) => read_as!(i8, I8),
            NcVariableType::Int(IntType::U8) => read_as!(u8, U8),
            NcVariableType::Int(IntType::I16) => read_as!(i16, I16),
            NcVariableType::Int(IntType::U16) => read_as!(u16, U16),
            NcVariableType::Int(IntType::I32) => read_as!(i32, I32),
            NcVariableType::Int(IntType::U32) => read_as!(u32, U32),
            NcVariableType::Int(IntType::I64) => read_as!(i64, I64),
            NcVariableType::Int(IntType::U64) => read_as!(u64, U64),
            NcVariableType::Float(FloatType::F32) => read_as!(f32, F32),
            NcVariableType::Float(FloatType::F64) => read_as!(f64, F64),
            other => {
                return Err(ImportError::UnsupportedType {
                    name: name.to_string(),
                    vartype: format!("{:?}", other),
                })
            }
        };

        debug!(variable = name, dtype = array.dtype(), "Read variable in stored type");
        Ok(array)
    }

    /// Read a 1D coordinate variable with CF decoding.
    pub fn coordinate(&self, name: &str) -> ImportResult<Vec<f64>> {
        let var = self.numeric_variable(name)?;
        let shape = dimension_lengths(&var);
        if shape.len() != 1 {
            return Err(ImportError::InvalidCoordinate {
                name: name.to_string(),
                reason: format!("expected 1 dimension, got {:?}", shape),
            });
        }
        read_decoded(&var, name)
    }

    /// WKT of the grid CRS, if the file carries one.
    pub fn crs_wkt(&self) -> Option<String> {
        let var = self.file.variable(SPATIAL_REF_VAR)?;
        CRS_WKT_ATTRS
            .iter()
            .find_map(|attr| get_string_attr(&var, attr))
    }

    /// A global attribute, if present and textual.
    pub fn global_string_attr(&self, name: &str) -> Option<String> {
        if !self.file.attributes().any(|attr| attr.name() == name) {
            return None;
        }
        match self.file.attribute(name)?.value().ok()? {
            AttributeValue::Str(value) => Some(value),
            _ => None,
        }
    }

    fn numeric_variable(&self, name: &str) -> ImportResult<netcdf::Variable<'_>> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| ImportError::MissingVariable(name.to_string()))?;

        match var.vartype() {
            NcVariableType::Int(_) | NcVariableType::Float(_) => Ok(var),
            other => Err(ImportError::UnsupportedType {
                name: name.to_string(),
                vartype: format!("{:?}", other),
            }),
        }
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn dimension_lengths(var: &netcdf::Variable) -> Vec<usize> {
    var.dimensions().iter().map(|dim| dim.len()).collect()
}

/// Read all values in their stored type and widen them to f64.
fn read_widened(var: &netcdf::Variable, name: &str) -> ImportResult<Vec<f64>> {
    macro_rules! widen {
        ($ty:ty) => {{
            let values: Vec<$ty> = var.get_values(..).map_err(|source| ImportError::Read {
                name: name.to_string(),
                source,
            })?;
            values.into_iter().map(|v| v as f64).collect()
        }};
    }

    let values: Vec<f64> = match var.vartype() {
        NcVariableType::Int(IntType::I8) => widen!(i8),
        NcVariableType::Int(IntType::U8) => widen!(u8),
        NcVariableType::Int(IntType::I16) => widen!(i16),
        NcVariableType::Int(IntType::U16) => widen!(u16),
        NcVariableType::Int(IntType::I32) => widen!(i32),
        NcVariableType::Int(IntType::U32) => widen!(u32),
        NcVariableType::Int(IntType::I64) => widen!(i64),
        NcVariableType::Int(IntType::U64) => widen!(u64),
        NcVariableType::Float(FloatType::F32) => widen!(f32),
        NcVariableType::Float(FloatType::F64) => widen!(f64),
        other => {
            return Err(ImportError::UnsupportedType {
                name: name.to_string(),
                vartype: format!("{:?}", other),
            })
        }
    };
    Ok(values)
}

/// Read all values as f64, masking fill values and applying scale/offset.
fn read_decoded(var: &netcdf::Variable, name: &str) -> ImportResult<Vec<f64>> {
    let raw = read_widened(var, name)?;

    let fill_value = get_f64_attr(var, "_FillValue");
    let missing_value = get_f64_attr(var, "missing_value");
    let scale_factor = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);

    Ok(raw
        .into_iter()
        .map(|val| {
            if Some(val) == fill_value || Some(val) == missing_value {
                f64::NAN
            } else {
                val * scale_factor + add_offset
            }
        })
        .collect())
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f64 attribute.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{fixtures::grid, temp_test_dir, CompositeFile, QualityValues};

    #[test]
    fn test_open_missing_file() {
        let dir = temp_test_dir();
        let err = PincastDataset::open(&dir.path().join("absent.nc"))
            .err()
            .expect("opening a missing file should fail");
        assert!(matches!(err, ImportError::Open { .. }));
    }

    #[test]
    fn test_read_f32_squeezes_time() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        CompositeFile::new(grid::FMI_SUBSET).write(&path).unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        let rate = dataset.read_f32("RATE").unwrap();
        assert_eq!(rate.dim(), (30, 40));
    }

    #[test]
    fn test_read_native_keeps_type() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        let mut file = CompositeFile::new(grid::FMI_SUBSET);
        file.quality = Some(("QI".to_string(), QualityValues::I16(vec![-3; 1200])));
        file.write(&path).unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        let quality = dataset.read_native("QI").unwrap();
        assert_eq!(quality.dtype(), "int16");
        assert_eq!(quality.shape(), (30, 40));
        assert_eq!(quality.to_f64()[[0, 0]], -3.0);
    }

    #[test]
    fn test_crs_and_institution_attributes() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        CompositeFile::new(grid::KM_100).write(&path).unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        assert!(dataset.crs_wkt().unwrap().starts_with("PROJCS["));
        assert_eq!(
            dataset.global_string_attr("nc.institution").as_deref(),
            Some("FMI")
        );
        assert_eq!(dataset.global_string_attr("nc.source"), None);
    }

    #[test]
    fn test_crs_from_gdal_spatial_ref_attribute() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        let mut file = CompositeFile::new(grid::KM_100);
        file.crs_attribute = "spatial_ref";
        file.write(&path).unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        assert!(dataset.crs_wkt().is_some());
    }

    #[test]
    fn test_missing_spatial_ref() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        CompositeFile::new(grid::KM_100)
            .with_crs(None)
            .write(&path)
            .unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        assert_eq!(dataset.crs_wkt(), None);
    }

    #[test]
    fn test_coordinate_values() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        CompositeFile::new(grid::KM_100).write(&path).unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        let y = dataset.coordinate("y").unwrap();
        assert_eq!(y.len(), 100);
        assert_eq!(y[0], 99.0);
        assert_eq!(y[99], 0.0);
    }

    #[test]
    fn test_coordinate_must_be_1d() {
        let dir = temp_test_dir();
        let path = dir.path().join("composite.nc");
        CompositeFile::new(grid::FMI_SUBSET).write(&path).unwrap();

        let dataset = PincastDataset::open(&path).unwrap();
        let err = dataset.coordinate("RATE").unwrap_err();
        assert!(matches!(err, ImportError::InvalidCoordinate { .. }));
    }
}
