//! Interpretation of WKT trees as horizontal coordinate reference systems.
//!
//! Only the pieces needed to produce a PROJ-style definition are kept:
//! the ellipsoid and datum, the projection method with its parameters, and
//! the linear unit of the projected axes.
//!
//! Parameter values are normalized on the way in: angles to degrees,
//! lengths to metres, scale factors untouched. WKT1 expresses parameters in
//! the units of the enclosing CRS; WKT2 may attach a unit per parameter.

use std::collections::BTreeMap;

use crate::error::{CrsError, CrsResult};
use crate::wkt::{self, WktNode};

const PROJECTED: &[&str] = &["PROJCS", "PROJCRS", "PROJECTEDCRS"];
const GEOGRAPHIC: &[&str] = &[
    "GEOGCS",
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "GEODCRS",
    "GEODETICCRS",
];
const BASE_GEOGRAPHIC: &[&str] = &["GEOGCS", "BASEGEOGCRS", "BASEGEODCRS"];
const DATUM: &[&str] = &["DATUM", "GEODETICDATUM", "TRF", "ENSEMBLE"];
const ELLIPSOID: &[&str] = &["SPHEROID", "ELLIPSOID"];
const LENGTH_UNIT: &[&str] = &["UNIT", "LENGTHUNIT"];
const ANGLE_UNIT: &[&str] = &["UNIT", "ANGLEUNIT"];

/// Radians per degree, the conversion factor WKT writes for `degree`.
const DEGREE: f64 = std::f64::consts::PI / 180.0;

/// Reference ellipsoid.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    pub name: String,
    /// Semi-major axis (metres)
    pub semi_major: f64,
    /// Inverse flattening (0 for a sphere)
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    /// Semi-minor axis (metres).
    pub fn semi_minor(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            self.semi_major
        } else {
            self.semi_major * (1.0 - 1.0 / self.inverse_flattening)
        }
    }
}

/// Geodetic datum of a CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub name: String,
    pub ellipsoid: Ellipsoid,
    /// Seven-parameter shift to WGS84, when the WKT carries one
    pub towgs84: Option<Vec<f64>>,
}

/// Unit of projected x/y coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearUnit {
    pub name: String,
    /// Metres per unit
    pub metres: f64,
}

impl LinearUnit {
    pub fn metre() -> Self {
        Self {
            name: "metre".to_string(),
            metres: 1.0,
        }
    }

    /// PROJ unit identifier, if this unit has one.
    pub fn proj_id(&self) -> Option<&'static str> {
        const KNOWN: &[(f64, &str)] = &[
            (1.0, "m"),
            (1000.0, "km"),
            (0.1, "dm"),
            (0.01, "cm"),
            (0.001, "mm"),
            (0.3048, "ft"),
            (0.304_800_609_601_219_2, "us-ft"),
            (1852.0, "kmi"),
        ];

        KNOWN
            .iter()
            .find(|(metres, _)| ((self.metres - metres) / metres).abs() < 1e-9)
            .map(|(_, id)| *id)
    }
}

/// Projection methods that have a PROJ equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMethod {
    /// WKT1 `Polar_Stereographic`: `latitude_of_origin` is the latitude of true
    /// scale, unless it is a pole
    PolarStereographic,
    PolarStereographicVariantA,
    PolarStereographicVariantB,
    Stereographic,
    ObliqueStereographic,
    LambertConformalConic1SP,
    LambertConformalConic2SP,
    TransverseMercator,
    Mercator1SP,
    Mercator2SP,
    LambertAzimuthalEqualArea,
    AlbersEqualArea,
    EquidistantCylindrical,
    Geostationary { sweep_x: bool },
}

impl ProjectionMethod {
    /// Resolve a WKT1 `PROJECTION` or WKT2 `METHOD` name.
    pub fn from_name(name: &str) -> Option<Self> {
        use ProjectionMethod::*;

        let method = match normalize(name).as_str() {
            "polar_stereographic" => PolarStereographic,
            "polar_stereographic_variant_a" => PolarStereographicVariantA,
            "polar_stereographic_variant_b" | "stereographic_north_pole"
            | "stereographic_south_pole" => PolarStereographicVariantB,
            "stereographic" => Stereographic,
            "oblique_stereographic" | "double_stereographic" => ObliqueStereographic,
            "lambert_conformal_conic_1sp" | "lambert_conic_conformal_1sp" => {
                LambertConformalConic1SP
            }
            "lambert_conformal_conic_2sp"
            | "lambert_conic_conformal_2sp"
            | "lambert_conformal_conic" => LambertConformalConic2SP,
            "transverse_mercator" | "gauss_kruger" => TransverseMercator,
            "mercator_1sp" | "mercator_variant_a" => Mercator1SP,
            "mercator_2sp" | "mercator_variant_b" => Mercator2SP,
            "lambert_azimuthal_equal_area" => LambertAzimuthalEqualArea,
            "albers_conic_equal_area" | "albers_equal_area" => AlbersEqualArea,
            "equirectangular" | "equidistant_cylindrical" | "plate_carree" => {
                EquidistantCylindrical
            }
            "geostationary_satellite" | "geostationary_satellite_sweep_y" => {
                Geostationary { sweep_x: false }
            }
            "geostationary_satellite_sweep_x" => Geostationary { sweep_x: true },
            _ => return None,
        };
        Some(method)
    }

    /// PROJ `+proj=` identifier.
    pub fn proj_name(&self) -> &'static str {
        use ProjectionMethod::*;

        match self {
            PolarStereographic
            | PolarStereographicVariantA
            | PolarStereographicVariantB
            | Stereographic => "stere",
            ObliqueStereographic => "sterea",
            LambertConformalConic1SP | LambertConformalConic2SP => "lcc",
            TransverseMercator => "tmerc",
            Mercator1SP | Mercator2SP => "merc",
            LambertAzimuthalEqualArea => "laea",
            AlbersEqualArea => "aea",
            EquidistantCylindrical => "eqc",
            Geostationary { .. } => "geos",
        }
    }
}

/// Map projection part of a projected CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub method: ProjectionMethod,
    /// Method name as written in the WKT
    pub method_name: String,
    /// Canonical PROJ parameter key to value (degrees / metres / unitless)
    pub parameters: BTreeMap<&'static str, f64>,
    pub unit: LinearUnit,
}

impl Projection {
    /// Parameter value by canonical key (`lat_0`, `lon_0`, `lat_1`, `lat_2`,
    /// `lat_ts`, `k`, `x_0`, `y_0`, `h`).
    pub fn parameter(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).copied()
    }
}

/// A horizontal CRS: geographic, or projected on top of a geographic base.
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    pub name: Option<String>,
    pub datum: Datum,
    /// `None` for geographic CRSs
    pub projection: Option<Projection>,
}

impl Crs {
    /// Parse a WKT1 or WKT2 string.
    pub fn from_wkt(input: &str) -> CrsResult<Self> {
        let root = wkt::parse(input)?;
        Self::from_node(&root)
    }

    /// Interpret an already-parsed WKT tree.
    pub fn from_node(root: &WktNode) -> CrsResult<Self> {
        if root.is(&["BOUNDCRS"]) {
            let source = root
                .child(&["SOURCECRS"])
                .and_then(|s| s.children().next())
                .ok_or_else(|| CrsError::MissingComponent("SOURCECRS".to_string()))?;
            return Self::from_node(source);
        }

        if root.is(&["COMPD_CS", "COMPOUNDCRS"]) {
            let horizontal = root
                .children()
                .find(|c| c.is(PROJECTED) || c.is(GEOGRAPHIC))
                .ok_or_else(|| {
                    CrsError::MissingComponent("horizontal component".to_string())
                })?;
            return Self::from_node(horizontal);
        }

        if root.is(PROJECTED) {
            return parse_projected(root);
        }

        if root.is(GEOGRAPHIC) {
            if is_geocentric(root) {
                return Err(CrsError::UnsupportedCrsType("geocentric".to_string()));
            }
            return Ok(Crs {
                name: root.name().map(str::to_string),
                datum: parse_datum(root)?,
                projection: None,
            });
        }

        Err(CrsError::UnsupportedCrsType(root.keyword.clone()))
    }

    /// Whether this CRS has projected (cartesian) axes.
    pub fn is_projected(&self) -> bool {
        self.projection.is_some()
    }

    /// PROJ unit identifier of the projected axes.
    ///
    /// `None` for geographic CRSs and for units PROJ has no name for.
    pub fn linear_unit(&self) -> Option<&'static str> {
        self.projection.as_ref().and_then(|p| p.unit.proj_id())
    }
}

fn parse_projected(root: &WktNode) -> CrsResult<Crs> {
    let base = root
        .child(BASE_GEOGRAPHIC)
        .ok_or_else(|| CrsError::MissingComponent("base geographic CRS".to_string()))?;
    let datum = parse_datum(base)?;
    let angle = angle_unit(base);
    let unit = projected_unit(root);

    // WKT1 keeps PROJECTION and PARAMETER as siblings; WKT2 nests both in CONVERSION
    let conversion = root.child(&["CONVERSION", "DERIVINGCONVERSION"]).unwrap_or(root);
    let method_node = conversion
        .child(&["PROJECTION", "METHOD"])
        .ok_or_else(|| CrsError::MissingComponent("projection method".to_string()))?;
    let method_name = method_node
        .name()
        .ok_or_else(|| CrsError::MissingComponent("projection method name".to_string()))?
        .to_string();
    let method = ProjectionMethod::from_name(&method_name)
        .ok_or_else(|| CrsError::UnsupportedMethod(method_name.clone()))?;

    let mut parameters = BTreeMap::new();
    for param in conversion.children_matching(&["PARAMETER"]) {
        let Some(key) = param.name().and_then(canonical_parameter) else {
            continue;
        };
        let Some(raw) = param.number(0) else {
            continue;
        };

        let value = match parameter_kind(key) {
            ParameterKind::Angle => {
                let radians_per_unit = param
                    .child(ANGLE_UNIT)
                    .and_then(|u| u.number(0))
                    .unwrap_or(angle);
                raw * radians_per_unit / DEGREE
            }
            ParameterKind::Length => {
                let metres_per_unit = param
                    .child(LENGTH_UNIT)
                    .and_then(|u| u.number(0))
                    .unwrap_or(unit.metres);
                raw * metres_per_unit
            }
            ParameterKind::Scale => raw,
        };
        parameters.insert(key, value);
    }

    Ok(Crs {
        name: root.name().map(str::to_string),
        datum,
        projection: Some(Projection {
            method,
            method_name,
            parameters,
            unit,
        }),
    })
}

fn parse_datum(crs: &WktNode) -> CrsResult<Datum> {
    let datum = crs
        .child(DATUM)
        .ok_or_else(|| CrsError::MissingComponent("DATUM".to_string()))?;
    let spheroid = datum
        .child(ELLIPSOID)
        .ok_or_else(|| CrsError::MissingComponent("ELLIPSOID".to_string()))?;

    let metres_per_unit = spheroid
        .child(LENGTH_UNIT)
        .and_then(|u| u.number(0))
        .unwrap_or(1.0);
    let semi_major = spheroid
        .number(0)
        .ok_or_else(|| CrsError::MissingComponent("semi-major axis".to_string()))?
        * metres_per_unit;
    let inverse_flattening = spheroid
        .number(1)
        .ok_or_else(|| CrsError::MissingComponent("inverse flattening".to_string()))?;

    let towgs84 = datum
        .child(&["TOWGS84"])
        .map(|t| t.numbers())
        .filter(|v| v.len() == 3 || v.len() == 7);

    Ok(Datum {
        name: datum.name().unwrap_or_default().to_string(),
        ellipsoid: Ellipsoid {
            name: spheroid.name().unwrap_or_default().to_string(),
            semi_major,
            inverse_flattening,
        },
        towgs84,
    })
}

/// Radians per angular unit of a geographic CRS (degree when unstated).
fn angle_unit(crs: &WktNode) -> f64 {
    crs.child(ANGLE_UNIT)
        .or_else(|| crs.child(&["AXIS"]).and_then(|axis| axis.child(ANGLE_UNIT)))
        .and_then(|u| u.number(0))
        .unwrap_or(DEGREE)
}

/// Linear unit of a projected CRS, from the CRS itself or its first axis.
fn projected_unit(crs: &WktNode) -> LinearUnit {
    let node = crs
        .child(LENGTH_UNIT)
        .or_else(|| crs.child(&["AXIS"]).and_then(|axis| axis.child(LENGTH_UNIT)));

    match node {
        Some(unit) => LinearUnit {
            name: unit.name().unwrap_or_default().to_string(),
            metres: unit.number(0).unwrap_or(1.0),
        },
        None => LinearUnit::metre(),
    }
}

fn is_geocentric(crs: &WktNode) -> bool {
    crs.child(&["CS"])
        .and_then(|cs| cs.identifier())
        .map(|kind| kind.eq_ignore_ascii_case("cartesian"))
        .unwrap_or(false)
}

enum ParameterKind {
    Angle,
    Length,
    Scale,
}

fn parameter_kind(key: &str) -> ParameterKind {
    match key {
        "x_0" | "y_0" | "h" => ParameterKind::Length,
        "k" => ParameterKind::Scale,
        _ => ParameterKind::Angle,
    }
}

/// Map a WKT1 or WKT2 parameter name to its PROJ key.
fn canonical_parameter(name: &str) -> Option<&'static str> {
    let key = match normalize(name).as_str() {
        "latitude_of_origin"
        | "latitude_of_natural_origin"
        | "latitude_of_center"
        | "latitude_of_centre"
        | "latitude_of_projection_centre"
        | "latitude_of_projection_center"
        | "latitude_of_false_origin" => "lat_0",
        "central_meridian"
        | "longitude_of_origin"
        | "longitude_of_natural_origin"
        | "longitude_of_center"
        | "longitude_of_centre"
        | "longitude_of_projection_centre"
        | "longitude_of_projection_center"
        | "longitude_of_false_origin"
        | "longitude_of_projection_origin"
        | "straight_vertical_longitude_from_pole" => "lon_0",
        "standard_parallel_1" | "latitude_of_1st_standard_parallel" => "lat_1",
        "standard_parallel_2" | "latitude_of_2nd_standard_parallel" => "lat_2",
        "latitude_of_standard_parallel" | "standard_parallel" => "lat_ts",
        "scale_factor"
        | "scale_factor_at_natural_origin"
        | "scale_factor_at_projection_centre"
        | "scale_factor_on_initial_line" => "k",
        "false_easting" | "easting_at_false_origin" | "easting_at_projection_centre" => "x_0",
        "false_northing" | "northing_at_false_origin" | "northing_at_projection_centre" => {
            "y_0"
        }
        "satellite_height" | "perspective_point_height" => "h",
        _ => return None,
    };
    Some(key)
}

/// Lowercase and collapse every non-alphanumeric run to a single `_`.
pub(crate) fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("Polar Stereographic (variant B)"),
            "polar_stereographic_variant_b"
        );
        assert_eq!(normalize("Lambert_Conformal_Conic_2SP"), "lambert_conformal_conic_2sp");
        assert_eq!(normalize("  Latitude of 1st standard parallel "), "latitude_of_1st_standard_parallel");
    }

    #[test]
    fn test_method_lookup() {
        assert_eq!(
            ProjectionMethod::from_name("Polar_Stereographic"),
            Some(ProjectionMethod::PolarStereographic)
        );
        assert_eq!(
            ProjectionMethod::from_name("Lambert Conic Conformal (2SP)"),
            Some(ProjectionMethod::LambertConformalConic2SP)
        );
        assert_eq!(ProjectionMethod::from_name("Krovak"), None);
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(canonical_parameter("central_meridian"), Some("lon_0"));
        assert_eq!(canonical_parameter("Longitude of origin"), Some("lon_0"));
        assert_eq!(
            canonical_parameter("Latitude of standard parallel"),
            Some("lat_ts")
        );
        assert_eq!(canonical_parameter("False easting"), Some("x_0"));
        assert_eq!(canonical_parameter("azimuth"), None);
    }

    #[test]
    fn test_linear_unit_ids() {
        let km = LinearUnit {
            name: "kilometre".to_string(),
            metres: 1000.0,
        };
        assert_eq!(km.proj_id(), Some("km"));
        assert_eq!(LinearUnit::metre().proj_id(), Some("m"));

        let odd = LinearUnit {
            name: "chain".to_string(),
            metres: 20.1168,
        };
        assert_eq!(odd.proj_id(), None);
    }

    #[test]
    fn test_sphere_semi_minor() {
        let sphere = Ellipsoid {
            name: "sphere".to_string(),
            semi_major: 6371000.0,
            inverse_flattening: 0.0,
        };
        assert_eq!(sphere.semi_minor(), 6371000.0);
    }
}
