use crate::error::TileError;
use geo_types::{Geometry, GeometryCollection};
use geojson::GeoJson;
use std::str::FromStr;
use wkt::{ToWkt, Wkt};

/// Text encodings a geometry can be read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    /// Well-Known Text format (e.g., "POLYGON((...))")
    Wkt,
    /// GeoJSON format
    GeoJson,
}

impl GeometryFormat {
    /// GeoJSON when the text opens with `{`, WKT otherwise.
    pub fn detect(s: &str) -> Self {
        if s.trim_start().starts_with('{') {
            GeometryFormat::GeoJson
        } else {
            GeometryFormat::Wkt
        }
    }

    pub fn parse(self, s: &str) -> Result<Geometry<f64>, TileError> {
        match self {
            GeometryFormat::Wkt => parse_wkt(s),
            GeometryFormat::GeoJson => parse_geojson(s),
        }
    }

    pub fn write(self, geometry: &Geometry<f64>) -> String {
        match self {
            GeometryFormat::Wkt => geometry.wkt_string(),
            GeometryFormat::GeoJson => {
                geojson::Geometry::new(geojson::Value::from(geometry)).to_string()
            }
        }
    }
}

fn parse_error(e: impl ToString) -> TileError {
    TileError::GeometryParseError(e.to_string())
}

fn from_geojson(geometry: geojson::Geometry) -> Result<Geometry<f64>, TileError> {
    Geometry::try_from(geometry).map_err(parse_error)
}

/// Parses a geometry string in whichever format [`GeometryFormat::detect`] picks.
pub fn parse_geometry(s: &str) -> Result<Geometry<f64>, TileError> {
    let trimmed = s.trim();
    GeometryFormat::detect(trimmed).parse(trimmed)
}

/// Parses GeoJSON into a `geo_types::Geometry`.
///
/// A FeatureCollection becomes a GeometryCollection; features without
/// geometry are dropped from it, but a lone feature must have one.
pub fn parse_geojson(s: &str) -> Result<Geometry<f64>, TileError> {
    match s.parse::<GeoJson>().map_err(parse_error)? {
        GeoJson::Geometry(geometry) => from_geojson(geometry),
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| parse_error("Feature has no geometry"))
            .and_then(from_geojson),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .filter_map(|feature| feature.geometry)
            .map(from_geojson)
            .collect::<Result<GeometryCollection<f64>, _>>()
            .map(Geometry::GeometryCollection),
    }
}

/// Parses WKT into a `geo_types::Geometry`.
pub fn parse_wkt(s: &str) -> Result<Geometry<f64>, TileError> {
    let wkt = Wkt::<f64>::from_str(s).map_err(parse_error)?;
    Geometry::try_from(wkt).map_err(parse_error)
}
