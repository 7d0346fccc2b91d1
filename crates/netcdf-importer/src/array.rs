//! 2D raster arrays read from NetCDF variables.

use ndarray::Array2;

use crate::error::{ImportError, ImportResult};

/// Reshape row-major `values` of the given `shape` into a 2D array.
///
/// Every axis of length 1 is dropped first, so `[1, rows, cols]` becomes
/// `[rows, cols]`. Fails unless exactly two axes remain.
pub fn squeeze_2d<T>(name: &str, shape: &[usize], values: Vec<T>) -> ImportResult<Array2<T>> {
    let squeezed: Vec<usize> = shape.iter().copied().filter(|&len| len != 1).collect();

    if squeezed.len() != 2 {
        return Err(ImportError::Shape {
            name: name.to_string(),
            reason: format!(
                "expected 2 dimensions after squeezing {:?}, got {}",
                shape,
                squeezed.len()
            ),
        });
    }

    Array2::from_shape_vec((squeezed[0], squeezed[1]), values).map_err(|e| ImportError::Shape {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// A 2D raster in the numeric type it was stored with.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterArray {
    I8(Array2<i8>),
    U8(Array2<u8>),
    I16(Array2<i16>),
    U16(Array2<u16>),
    I32(Array2<i32>),
    U32(Array2<u32>),
    I64(Array2<i64>),
    U64(Array2<u64>),
    F32(Array2<f32>),
    F64(Array2<f64>),
}

macro_rules! each_variant {
    ($value:expr, $array:ident => $body:expr) => {
        match $value {
            RasterArray::I8($array) => $body,
            RasterArray::U8($array) => $body,
            RasterArray::I16($array) => $body,
            RasterArray::U16($array) => $body,
            RasterArray::I32($array) => $body,
            RasterArray::U32($array) => $body,
            RasterArray::I64($array) => $body,
            RasterArray::U64($array) => $body,
            RasterArray::F32($array) => $body,
            RasterArray::F64($array) => $body,
        }
    };
}

impl RasterArray {
    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        each_variant!(self, array => array.dim())
    }

    /// Element type name, numpy style.
    pub fn dtype(&self) -> &'static str {
        match self {
            RasterArray::I8(_) => "int8",
            RasterArray::U8(_) => "uint8",
            RasterArray::I16(_) => "int16",
            RasterArray::U16(_) => "uint16",
            RasterArray::I32(_) => "int32",
            RasterArray::U32(_) => "uint32",
            RasterArray::I64(_) => "int64",
            RasterArray::U64(_) => "uint64",
            RasterArray::F32(_) => "float32",
            RasterArray::F64(_) => "float64",
        }
    }

    /// Copy of the values widened to f64. 64-bit integers above 2^53 lose precision.
    pub fn to_f64(&self) -> Array2<f64> {
        each_variant!(self, array => array.mapv(|v| v as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squeeze_leading_time_axis() {
        let values: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let array = squeeze_2d("RATE", &[1, 2, 3], values).unwrap();
        assert_eq!(array.dim(), (2, 3));
        assert_eq!(array[[0, 2]], 2.0);
        assert_eq!(array[[1, 0]], 3.0);
    }

    #[test]
    fn test_squeeze_plain_2d() {
        let array = squeeze_2d("RATE", &[2, 2], vec![1u8, 2, 3, 4]).unwrap();
        assert_eq!(array.dim(), (2, 2));
        assert_eq!(array[[1, 1]], 4);
    }

    #[test]
    fn test_squeeze_inner_singletons() {
        let array = squeeze_2d("RATE", &[1, 3, 1, 2, 1], vec![0i16; 6]).unwrap();
        assert_eq!(array.dim(), (3, 2));
    }

    #[test]
    fn test_squeeze_rejects_3d() {
        let err = squeeze_2d("RATE", &[2, 2, 2], vec![0.0f32; 8]).unwrap_err();
        assert!(matches!(err, ImportError::Shape { .. }));
    }

    #[test]
    fn test_squeeze_rejects_single_row() {
        // A 1 x N raster collapses to one axis.
        let err = squeeze_2d("RATE", &[1, 1, 5], vec![0.0f32; 5]).unwrap_err();
        assert!(err.to_string().contains("got 1"));
    }

    #[test]
    fn test_squeeze_rejects_length_mismatch() {
        let err = squeeze_2d("RATE", &[2, 3], vec![0.0f32; 5]).unwrap_err();
        assert!(matches!(err, ImportError::Shape { .. }));
    }

    #[test]
    fn test_raster_array_accessors() {
        let quality = RasterArray::U8(Array2::from_elem((3, 4), 200));
        assert_eq!(quality.shape(), (3, 4));
        assert_eq!(quality.dtype(), "uint8");
        assert_eq!(quality.to_f64()[[2, 3]], 200.0);

        let quality = RasterArray::I16(Array2::from_elem((1, 2), -5));
        assert_eq!(quality.dtype(), "int16");
        assert_eq!(quality.to_f64()[[0, 1]], -5.0);
    }
}
