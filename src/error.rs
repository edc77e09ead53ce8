use thiserror::Error;

/// Error type for quadtile operations.
#[derive(Debug, Error, PartialEq)]
pub enum TileError {
    /// Latitude outside the open interval (-90, 90), where Mercator is undefined.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),
    /// A coordinate that is NaN or infinite.
    #[error("Invalid coordinate: ({0}, {1})")]
    InvalidCoordinate(f64, f64),
    /// Precision beyond what a 64-bit ordinal can represent, or zero where a field needs one.
    #[error("Invalid precision: {0}")]
    InvalidPrecision(u8),
    /// A tile key containing something other than base-4 digits.
    #[error("Invalid tile: {0:?}")]
    InvalidTile(String),
    /// Tiles of different lengths passed where one precision is required.
    #[error("Mixed precision tiles: {0} and {1}")]
    MixedPrecision(usize, usize),
    /// A polygon ring with no points.
    #[error("Polygon has no points")]
    EmptyPolygon,
    /// Geometry type that cannot be tiled.
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),
    /// Failed to parse geometry from string (GeoJSON or WKT).
    #[error("Geometry parse error: {0}")]
    GeometryParseError(String),
    /// CSV parsing or reading error.
    #[error("CSV error: {0}")]
    CsvError(String),
    /// File I/O or serialization error.
    #[error("IO error: {0}")]
    IoError(String),
}
