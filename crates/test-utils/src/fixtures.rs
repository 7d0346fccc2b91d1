//! Common test fixtures for importer tests.
//!
//! This module provides pre-defined CRS strings, grid layouts and attribute
//! values that represent the PINCAST composite file family.

/// WKT coordinate reference systems, as found in `spatial_ref:crs_wkt`.
pub mod wkt {
    /// FMI radar composite grid: polar stereographic, true scale at 60N,
    /// central meridian 25E, kilometre axes (WKT1, GDAL flavour).
    pub const FMI_STEREO_KM: &str = r#"PROJCS["FMI radar composite",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Polar_Stereographic"],PARAMETER["latitude_of_origin",60],PARAMETER["central_meridian",25],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["kilometre",1000],AXIS["Easting",EAST],AXIS["Northing",NORTH]]"#;

    /// PROJ definition expected for [`FMI_STEREO_KM`].
    pub const FMI_STEREO_KM_PROJ: &str =
        "+proj=stere +lat_0=90 +lat_ts=60 +lon_0=25 +x_0=0 +y_0=0 +datum=WGS84 +units=km";

    /// The same grid as [`FMI_STEREO_KM`] written as WKT2:2019 by PROJ.
    pub const FMI_STEREO_KM_WKT2: &str = r#"PROJCRS["FMI radar composite",BASEGEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563,LENGTHUNIT["metre",1]]],PRIMEM["Greenwich",0,ANGLEUNIT["degree",0.0174532925199433]],ID["EPSG",4326]],CONVERSION["unnamed",METHOD["Polar Stereographic (variant B)",ID["EPSG",9829]],PARAMETER["Latitude of standard parallel",60,ANGLEUNIT["degree",0.0174532925199433],ID["EPSG",8832]],PARAMETER["Longitude of origin",25,ANGLEUNIT["degree",0.0174532925199433],ID["EPSG",8833]],PARAMETER["False easting",0,LENGTHUNIT["kilometre",1000],ID["EPSG",8806]],PARAMETER["False northing",0,LENGTHUNIT["kilometre",1000],ID["EPSG",8807]]],CS[Cartesian,2],AXIS["(E)",south,MERIDIAN[115,ANGLEUNIT["degree",0.0174532925199433]],ORDER[1],LENGTHUNIT["kilometre",1000,ID["EPSG",9036]]],AXIS["(N)",south,MERIDIAN[25,ANGLEUNIT["degree",0.0174532925199433]],ORDER[2],LENGTHUNIT["kilometre",1000,ID["EPSG",9036]]]]"#;

    /// Lambert conformal conic over Europe with metre axes and non-zero false origin.
    pub const LAMBERT_METRE: &str = r#"PROJCS["LCC Europe",GEOGCS["ETRS89",DATUM["European_Terrestrial_Reference_System_1989",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Lambert_Conformal_Conic_2SP"],PARAMETER["standard_parallel_1",35],PARAMETER["standard_parallel_2",65],PARAMETER["latitude_of_origin",52],PARAMETER["central_meridian",10],PARAMETER["false_easting",4000000],PARAMETER["false_northing",2800000],UNIT["metre",1]]"#;

    /// Plain WGS84 geographic CRS (no cartesian unit).
    pub const WGS84_GEOGRAPHIC: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

    /// Text that is not a CRS at all.
    pub const CORRUPTED: &str = "PROJCS[\"truncated\",GEOGCS[\"WGS 84\",DATUM[";
}

/// Common grid layouts for testing.
pub mod grid {
    /// Grid layout: size plus the first value and step of each axis.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GridLayout {
        pub width: usize,
        pub height: usize,
        pub x0: f64,
        pub dx: f64,
        pub y0: f64,
        pub dy: f64,
    }

    impl GridLayout {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// x coordinate values.
        pub fn x(&self) -> Vec<f64> {
            crate::create_axis(self.x0, self.dx, self.width)
        }

        /// y coordinate values.
        pub fn y(&self) -> Vec<f64> {
            crate::create_axis(self.y0, self.dy, self.height)
        }
    }

    /// 100x100 km grid, x ascending 0..99, y descending 99..0.
    pub const KM_100: GridLayout = GridLayout {
        width: 100,
        height: 100,
        x0: 0.0,
        dx: 1.0,
        y0: 99.0,
        dy: -1.0,
    };

    /// Non-square 1 km grid placed like the FMI composite.
    pub const FMI_SUBSET: GridLayout = GridLayout {
        width: 40,
        height: 30,
        x0: -118.0,
        dx: 1.0,
        y0: -3710.0,
        dy: -1.0,
    };

    /// 500 m grid in metres with both axes ascending.
    pub const METRE_ASCENDING: GridLayout = GridLayout {
        width: 12,
        height: 8,
        x0: 3_500_000.0,
        dx: 500.0,
        y0: 2_000_000.0,
        dy: 500.0,
    };
}

/// Attribute values used by the composite generator.
pub mod attrs {
    /// Global attribute holding the institution name
    pub const INSTITUTION_KEY: &str = "nc.institution";

    /// Institution written by the FMI composite generator
    pub const FMI: &str = "FMI";

    /// Default precipitation variable
    pub const RATE: &str = "RATE";

    /// Quality variable written alongside the rain rate
    pub const QUALITY: &str = "QUALITY";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout_size() {
        assert_eq!(grid::KM_100.size(), 10_000);
        assert_eq!(grid::FMI_SUBSET.size(), 1200);
    }

    #[test]
    fn test_grid_layout_axes() {
        let y = grid::KM_100.y();
        assert_eq!(y.first(), Some(&99.0));
        assert_eq!(y.last(), Some(&0.0));

        let x = grid::METRE_ASCENDING.x();
        assert_eq!(x[1] - x[0], 500.0);
    }
}
