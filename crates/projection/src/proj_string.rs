//! PROJ-style (`+key=value`) definitions.
//!
//! Output follows the layout PROJ itself prints for a CRS built from WKT:
//! projection, projection parameters, datum or ellipsoid, then units.
//! Lengths are written in metres regardless of the CRS unit, as PROJ expects.

use crate::crs::{Crs, Datum, ProjectionMethod};
use crate::error::{CrsError, CrsResult};

/// Named PROJ ellipsoids recognised from their defining constants.
const KNOWN_ELLIPSOIDS: &[(&str, f64, f64)] = &[
    ("WGS84", 6_378_137.0, 298.257_223_563),
    ("GRS80", 6_378_137.0, 298.257_222_101),
    ("intl", 6_378_388.0, 297.0),
    ("bessel", 6_377_397.155, 299.152_812_8),
    ("clrk66", 6_378_206.4, 294.978_698_2),
    ("airy", 6_377_563.396, 299.324_964_6),
    ("krass", 6_378_245.0, 298.3),
];

const WGS84_DATUM_NAMES: &[&str] = &[
    "wgs_1984",
    "wgs84",
    "wgs_84",
    "d_wgs_1984",
    "world_geodetic_system_1984",
    "world_geodetic_system_1984_ensemble",
];

impl Crs {
    /// Render this CRS as a PROJ-style definition string.
    pub fn to_proj4(&self) -> CrsResult<String> {
        let mut terms: Vec<(&str, String)> = Vec::new();

        match &self.projection {
            None => terms.push(("proj", "longlat".to_string())),
            Some(projection) => {
                terms.push(("proj", projection.method.proj_name().to_string()));
                let p = |key: &str| projection.parameter(key);
                let x_0 = p("x_0").unwrap_or(0.0);
                let y_0 = p("y_0").unwrap_or(0.0);

                match projection.method {
                    ProjectionMethod::PolarStereographic => {
                        // A pole origin carries a scale factor (variant A),
                        // any other latitude is the standard parallel (variant B)
                        let origin = p("lat_0").ok_or_else(|| missing("latitude_of_origin"))?;
                        terms.push(("lat_0", fmt(pole(origin))));
                        if origin.abs() == 90.0 {
                            terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                            terms.push(("k", fmt(p("k").unwrap_or(1.0))));
                        } else {
                            terms.push(("lat_ts", fmt(origin)));
                            terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        }
                    }
                    ProjectionMethod::PolarStereographicVariantA => {
                        let origin = p("lat_0").ok_or_else(|| missing("latitude of natural origin"))?;
                        terms.push(("lat_0", fmt(pole(origin))));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        terms.push(("k", fmt(p("k").unwrap_or(1.0))));
                    }
                    ProjectionMethod::PolarStereographicVariantB => {
                        let lat_ts = p("lat_ts")
                            .or_else(|| p("lat_0"))
                            .ok_or_else(|| missing("latitude of standard parallel"))?;
                        terms.push(("lat_0", fmt(pole(lat_ts))));
                        terms.push(("lat_ts", fmt(lat_ts)));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                    }
                    ProjectionMethod::Stereographic
                    | ProjectionMethod::ObliqueStereographic
                    | ProjectionMethod::TransverseMercator => {
                        terms.push(("lat_0", fmt(p("lat_0").unwrap_or(0.0))));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        terms.push(("k", fmt(p("k").unwrap_or(1.0))));
                    }
                    ProjectionMethod::LambertConformalConic1SP => {
                        let lat_0 = p("lat_0").ok_or_else(|| missing("latitude_of_origin"))?;
                        terms.push(("lat_1", fmt(lat_0)));
                        terms.push(("lat_0", fmt(lat_0)));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        terms.push(("k_0", fmt(p("k").unwrap_or(1.0))));
                    }
                    ProjectionMethod::LambertConformalConic2SP
                    | ProjectionMethod::AlbersEqualArea => {
                        let lat_1 = p("lat_1").ok_or_else(|| missing("standard_parallel_1"))?;
                        terms.push(("lat_0", fmt(p("lat_0").unwrap_or(0.0))));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        terms.push(("lat_1", fmt(lat_1)));
                        terms.push(("lat_2", fmt(p("lat_2").unwrap_or(lat_1))));
                    }
                    ProjectionMethod::Mercator1SP => {
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        terms.push(("k", fmt(p("k").unwrap_or(1.0))));
                    }
                    ProjectionMethod::Mercator2SP => {
                        let lat_ts = p("lat_ts").or_else(|| p("lat_1")).unwrap_or(0.0);
                        terms.push(("lat_ts", fmt(lat_ts)));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                    }
                    ProjectionMethod::LambertAzimuthalEqualArea => {
                        terms.push(("lat_0", fmt(p("lat_0").unwrap_or(0.0))));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                    }
                    ProjectionMethod::EquidistantCylindrical => {
                        let lat_ts = p("lat_ts").or_else(|| p("lat_1")).unwrap_or(0.0);
                        terms.push(("lat_ts", fmt(lat_ts)));
                        terms.push(("lat_0", fmt(p("lat_0").unwrap_or(0.0))));
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                    }
                    ProjectionMethod::Geostationary { sweep_x } => {
                        let h = p("h").ok_or_else(|| missing("satellite_height"))?;
                        terms.push(("lon_0", fmt(p("lon_0").unwrap_or(0.0))));
                        terms.push(("h", fmt(h)));
                        terms.push(("sweep", if sweep_x { "x" } else { "y" }.to_string()));
                    }
                }

                terms.push(("x_0", fmt(x_0)));
                terms.push(("y_0", fmt(y_0)));
            }
        }

        push_datum(&mut terms, &self.datum);

        if let Some(projection) = &self.projection {
            match projection.unit.proj_id() {
                Some(id) => terms.push(("units", id.to_string())),
                None => terms.push(("to_meter", fmt(projection.unit.metres))),
            }
        }

        Ok(terms
            .iter()
            .map(|(key, value)| format!("+{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Check that a generated definition is accepted by the PROJ parser.
    pub fn validate(definition: &str) -> CrsResult<()> {
        proj4rs::Proj::from_proj_string(definition)
            .map(|_| ())
            .map_err(|e| CrsError::Rejected(e.to_string()))
    }
}

fn push_datum(terms: &mut Vec<(&str, String)>, datum: &Datum) {
    let datum_name = crate::crs::normalize(&datum.name);
    let ellipsoid = &datum.ellipsoid;

    let is_wgs84_ellipsoid = (ellipsoid.semi_major - 6_378_137.0).abs() < 1e-3
        && (ellipsoid.inverse_flattening - 298.257_223_563).abs() < 1e-6;
    if WGS84_DATUM_NAMES.contains(&datum_name.as_str()) && is_wgs84_ellipsoid {
        terms.push(("datum", "WGS84".to_string()));
        return;
    }

    let named = KNOWN_ELLIPSOIDS.iter().find(|(_, a, rf)| {
        (ellipsoid.semi_major - a).abs() < 1e-3 && (ellipsoid.inverse_flattening - rf).abs() < 1e-6
    });

    match named {
        Some((name, _, _)) => terms.push(("ellps", name.to_string())),
        None => {
            terms.push(("a", fmt(ellipsoid.semi_major)));
            terms.push(("b", fmt(ellipsoid.semi_minor())));
        }
    }

    if let Some(towgs84) = &datum.towgs84 {
        let values = towgs84.iter().map(|v| fmt(*v)).collect::<Vec<_>>();
        terms.push(("towgs84", values.join(",")));
    }
}

/// Pole latitude on the same hemisphere as `lat`.
fn pole(lat: f64) -> f64 {
    if lat < 0.0 {
        -90.0
    } else {
        90.0
    }
}

fn missing(what: &str) -> CrsError {
    CrsError::MissingComponent(format!("parameter {}", what))
}

/// Shortest round-trip decimal, trimming float noise from unit conversions.
fn fmt(value: f64) -> String {
    let rounded = (value * 1e9).round() / 1e9;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}
