//! Writer for synthetic PINCAST composite NetCDF files.
//!
//! Produces files with the layout of the radar composite generator: a rain
//! rate variable over `(time, y, x)`, optional quality variable, `x`/`y`
//! coordinate variables, a `spatial_ref` grid-mapping variable carrying the
//! CRS as WKT, and the institution as a global attribute.

use std::path::Path;

use crate::fixtures::{attrs, grid::GridLayout, wkt};
use crate::generators::{create_quality_grid, create_rain_rate_grid};

/// Values for the optional quality variable, in their on-disk type.
#[derive(Debug, Clone)]
pub enum QualityValues {
    U8(Vec<u8>),
    I16(Vec<i16>),
    F32(Vec<f32>),
}

/// Description of a composite file to write.
#[derive(Debug, Clone)]
pub struct CompositeFile {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub precip_name: String,
    /// Row-major `[y, x]` rain rates
    pub precip: Vec<f32>,
    /// Prepend a `time` dimension of length 1 to the data variables
    pub time_dimension: bool,
    /// `(scale_factor, add_offset, _FillValue)`: store rain rate packed as i16
    pub packing: Option<(f32, f32, i16)>,
    pub quality: Option<(String, QualityValues)>,
    /// Write quality over its own `(rows, cols)` dimensions instead of the grid's
    pub quality_shape: Option<(usize, usize)>,
    /// Coordinate variables (`"x"`, `"y"`) to leave out; the dimension stays
    pub omit_coordinates: Vec<&'static str>,
    /// `None` omits the `spatial_ref` variable entirely
    pub crs_wkt: Option<String>,
    /// Attribute of `spatial_ref` holding the WKT
    pub crs_attribute: &'static str,
    pub institution: Option<String>,
}

impl CompositeFile {
    /// A composite over `layout` with default names and no quality field.
    pub fn new(layout: GridLayout) -> Self {
        Self {
            x: layout.x(),
            y: layout.y(),
            precip_name: attrs::RATE.to_string(),
            precip: create_rain_rate_grid(layout.width, layout.height, 7),
            time_dimension: true,
            packing: None,
            quality: None,
            quality_shape: None,
            omit_coordinates: Vec::new(),
            crs_wkt: Some(wkt::FMI_STEREO_KM.to_string()),
            crs_attribute: "crs_wkt",
            institution: Some(attrs::FMI.to_string()),
        }
    }

    /// Rain rate plus a u8 `QUALITY` field.
    pub fn with_quality(mut self) -> Self {
        let values = create_quality_grid(self.x.len(), self.y.len());
        self.quality = Some((attrs::QUALITY.to_string(), QualityValues::U8(values)));
        self
    }

    /// A u8 `QUALITY` field with a shape of its own.
    pub fn with_quality_shape(mut self, rows: usize, cols: usize) -> Self {
        let values = create_quality_grid(cols, rows);
        self.quality = Some((attrs::QUALITY.to_string(), QualityValues::U8(values)));
        self.quality_shape = Some((rows, cols));
        self
    }

    pub fn without_coordinate(mut self, name: &'static str) -> Self {
        self.omit_coordinates.push(name);
        self
    }

    pub fn with_crs(mut self, wkt: Option<&str>) -> Self {
        self.crs_wkt = wkt.map(str::to_string);
        self
    }

    pub fn with_institution(mut self, institution: Option<&str>) -> Self {
        self.institution = institution.map(str::to_string);
        self
    }

    pub fn with_precip(mut self, name: &str, values: Vec<f32>) -> Self {
        self.precip_name = name.to_string();
        self.precip = values;
        self
    }

    /// Write the file, replacing anything already at `path`.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let mut file = netcdf::create(path)?;

        let width = self.x.len();
        let height = self.y.len();
        let dims: Vec<&str> = if self.time_dimension {
            file.add_dimension("time", 1)?;
            vec!["time", "y", "x"]
        } else {
            vec!["y", "x"]
        };
        file.add_dimension("y", height)?;
        file.add_dimension("x", width)?;

        for (name, values) in [("x", &self.x), ("y", &self.y)] {
            if self.omit_coordinates.contains(&name) {
                continue;
            }
            let mut var = file.add_variable::<f64>(name, &[name])?;
            var.put_attribute("standard_name", format!("projection_{}_coordinate", name))?;
            var.put_values(values, ..)?;
        }

        match self.packing {
            None => {
                let mut rate = file.add_variable::<f32>(&self.precip_name, &dims)?;
                rate.put_attribute("units", "mm/h")?;
                rate.put_attribute("grid_mapping", "spatial_ref")?;
                rate.put_values(&self.precip, ..)?;
            }
            Some((scale, offset, fill)) => {
                let packed: Vec<i16> = self
                    .precip
                    .iter()
                    .map(|v| {
                        if v.is_finite() {
                            ((v - offset) / scale).round() as i16
                        } else {
                            fill
                        }
                    })
                    .collect();
                let mut rate = file.add_variable::<i16>(&self.precip_name, &dims)?;
                rate.put_attribute("_FillValue", fill)?;
                rate.put_attribute("scale_factor", scale)?;
                rate.put_attribute("add_offset", offset)?;
                rate.put_attribute("units", "mm/h")?;
                rate.put_values(&packed, ..)?;
            }
        }

        if let Some((name, values)) = &self.quality {
            let dims: Vec<&str> = match self.quality_shape {
                Some((rows, cols)) => {
                    file.add_dimension("quality_y", rows)?;
                    file.add_dimension("quality_x", cols)?;
                    vec!["quality_y", "quality_x"]
                }
                None => dims.clone(),
            };
            match values {
                QualityValues::U8(v) => {
                    let mut var = file.add_variable::<u8>(name, &dims)?;
                    var.put_values(v, ..)?;
                }
                QualityValues::I16(v) => {
                    let mut var = file.add_variable::<i16>(name, &dims)?;
                    var.put_values(v, ..)?;
                }
                QualityValues::F32(v) => {
                    let mut var = file.add_variable::<f32>(name, &dims)?;
                    var.put_values(v, ..)?;
                }
            }
        }

        if let Some(crs) = &self.crs_wkt {
            let mut spatial_ref = file.add_variable::<i32>("spatial_ref", &[])?;
            spatial_ref.put_attribute(self.crs_attribute, crs.as_str())?;
        }

        if let Some(institution) = &self.institution {
            file.add_attribute(attrs::INSTITUTION_KEY, institution.as_str())?;
        }

        Ok(())
    }
}
