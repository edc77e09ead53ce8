use crate::error::TileError;
use crate::field::{FieldValue, PointField, TileEncoding};
use crate::geom::{GeometryFormat, parse_geometry};
use crate::tile::Tile;
use geo_types::Geometry;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

enum SourceIndices {
    Geometry(usize),
    Coordinates { x_idx: usize, y_idx: usize },
}

#[derive(Debug, Clone)]
pub enum CoordinateSource {
    /// A single column containing WKT or GeoJSON geometry
    GeometryColumn(String),
    /// Separate longitude and latitude columns
    CoordinateColumns { x_column: String, y_column: String },
}

#[derive(Debug, Clone)]
pub struct CsvTileConfig {
    pub source: CoordinateSource,
    pub exclude_columns: Vec<String>,
    pub precision: u8,
    pub encoding: TileEncoding,
    pub include_tile_geometry: Option<GeometryFormat>,
}

impl CsvTileConfig {
    /// Create config for a CSV with a geometry column (WKT or GeoJSON).
    ///
    /// # Example
    /// ```
    /// use quadtile::CsvTileConfig;
    ///
    /// let config = CsvTileConfig::new("geometry", 15);
    /// ```
    pub fn new(geometry_column: impl Into<String>, precision: u8) -> Self {
        Self::with_source(
            CoordinateSource::GeometryColumn(geometry_column.into()),
            precision,
        )
    }

    /// Create config for a CSV with separate longitude/latitude columns.
    ///
    /// # Example
    /// ```
    /// use quadtile::{CsvTileConfig, TileEncoding};
    ///
    /// let config = CsvTileConfig::from_coords("Longitude", "Latitude", 15)
    ///     .encoding(TileEncoding::Quadkey);
    /// ```
    pub fn from_coords(
        x_column: impl Into<String>,
        y_column: impl Into<String>,
        precision: u8,
    ) -> Self {
        Self::with_source(
            CoordinateSource::CoordinateColumns {
                x_column: x_column.into(),
                y_column: y_column.into(),
            },
            precision,
        )
    }

    fn with_source(source: CoordinateSource, precision: u8) -> Self {
        Self {
            source,
            exclude_columns: Vec::new(),
            precision,
            encoding: TileEncoding::default(),
            include_tile_geometry: None,
        }
    }

    pub fn exclude(mut self, columns: Vec<String>) -> Self {
        self.exclude_columns = columns;
        self
    }

    pub fn encoding(mut self, encoding: TileEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    // Include the tile outline in output.
    pub fn with_tile_geometry(mut self, format: GeometryFormat) -> Self {
        self.include_tile_geometry = Some(format);
        self
    }
}

pub trait CsvToTiles {
    fn to_tile_csv(
        &self,
        output_path: impl AsRef<Path>,
        config: &CsvTileConfig,
    ) -> Result<usize, TileError>;
}

impl<P: AsRef<Path>> CsvToTiles for P {
    fn to_tile_csv(
        &self,
        output_path: impl AsRef<Path>,
        config: &CsvTileConfig,
    ) -> Result<usize, TileError> {
        csv_to_tile_csv(self, output_path, config)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str, kind: &str) -> Result<usize, TileError> {
    if name.is_empty() {
        return Err(TileError::CsvError(format!(
            "{kind} column name cannot be empty"
        )));
    }
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| TileError::CsvError(format!("{kind} column '{name}' not found")))
}

fn parse_coordinate(value: &str, kind: &str) -> Result<f64, TileError> {
    value
        .parse()
        .map_err(|_| TileError::CsvError(format!("Invalid {kind} coordinate: '{value}'")))
}

/// Converts a CSV file with geometry or coordinate columns to a CSV file of tiles.
///
/// Each input row produces one output row per tile it touches: points give one
/// tile, lines and polygons every tile of their bounding box. The `tile`
/// column holds the ordinal or the quadkey depending on the configured
/// encoding. Rows with an empty geometry or coordinate are skipped. Output is
/// streamed; returns the number of tile rows written.
///
/// # Example with geometry column (WKT or GeoJSON)
///
/// ```no_run
/// use quadtile::{csv_to_tile_csv, CsvTileConfig, GeometryFormat};
///
/// let config = CsvTileConfig::new("Geo Shape", 15)
///     .exclude(vec!["Geo Point".into()])
///     .with_tile_geometry(GeometryFormat::Wkt);
///
/// csv_to_tile_csv("input.csv", "output.csv", &config).unwrap();
/// ```
///
/// # Example with coordinate columns
///
/// ```no_run
/// use quadtile::{csv_to_tile_csv, CsvTileConfig};
///
/// let config = CsvTileConfig::from_coords("Longitude", "Latitude", 15);
///
/// csv_to_tile_csv("stops.csv", "output.csv", &config).unwrap();
/// ```
pub fn csv_to_tile_csv(
    csv_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &CsvTileConfig,
) -> Result<usize, TileError> {
    let field = PointField::builder()
        .precision(config.precision)
        .encoding(config.encoding)
        .build()?;

    let file = File::open(csv_path).map_err(|e| TileError::IoError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| TileError::CsvError(e.to_string()))?
        .clone();

    // source columns never reach the output
    let (source_indices, mut exclude_indices) = match &config.source {
        CoordinateSource::GeometryColumn(col) => {
            let idx = column_index(&headers, col, "Geometry")?;
            (SourceIndices::Geometry(idx), HashSet::from([idx]))
        }
        CoordinateSource::CoordinateColumns { x_column, y_column } => {
            let x_idx = column_index(&headers, x_column, "X")?;
            let y_idx = column_index(&headers, y_column, "Y")?;
            (
                SourceIndices::Coordinates { x_idx, y_idx },
                HashSet::from([x_idx, y_idx]),
            )
        }
    };

    for col_name in &config.exclude_columns {
        if let Some(idx) = headers.iter().position(|h| h == col_name) {
            exclude_indices.insert(idx);
        }
    }

    let out_file = File::create(output_path).map_err(|e| TileError::IoError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(out_file);

    let mut header_row: Vec<&str> = vec!["tile"];
    if config.include_tile_geometry.is_some() {
        header_row.push("tile_geometry");
    }
    for (i, h) in headers.iter().enumerate() {
        if !exclude_indices.contains(&i) {
            header_row.push(h);
        }
    }
    writer
        .write_record(&header_row)
        .map_err(|e| TileError::CsvError(e.to_string()))?;

    let mut written = 0;
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| TileError::CsvError(e.to_string()))?;

        let tiles: Vec<Tile> = match &source_indices {
            SourceIndices::Geometry(idx) => {
                let geom_str = record.get(*idx).unwrap_or_default().trim();
                if geom_str.is_empty() {
                    log::warn!("row {}: empty geometry, skipped", line + 1);
                    continue;
                }
                let geom = parse_geometry(geom_str)?;
                Tile::from_geometry(&geom, field.precision())?
            }
            SourceIndices::Coordinates { x_idx, y_idx } => {
                let x_str = record.get(*x_idx).unwrap_or_default().trim();
                let y_str = record.get(*y_idx).unwrap_or_default().trim();
                if x_str.is_empty() || y_str.is_empty() {
                    log::warn!("row {}: missing coordinate, skipped", line + 1);
                    continue;
                }
                let x = parse_coordinate(x_str, "X")?;
                let y = parse_coordinate(y_str, "Y")?;
                vec![field.tile(&(x, y))?]
            }
        };

        for tile in tiles {
            let value = match field.value(&tile) {
                FieldValue::Ordinal(ordinal) => ordinal.to_string(),
                FieldValue::Quadkey(key) => key,
            };
            let mut row: Vec<String> = vec![value];

            if let Some(format) = config.include_tile_geometry {
                row.push(format.write(&Geometry::Polygon(tile.to_polygon())));
            }

            for (i, cell) in record.iter().enumerate() {
                if !exclude_indices.contains(&i) {
                    row.push(cell.to_string());
                }
            }
            writer
                .write_record(&row)
                .map_err(|e| TileError::CsvError(e.to_string()))?;
            written += 1;
        }
    }

    writer
        .flush()
        .map_err(|e| TileError::IoError(e.to_string()))?;

    log::debug!("wrote {written} tile rows at precision {}", field.precision());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn io_err(e: std::io::Error) -> TileError {
        TileError::IoError(e.to_string())
    }

    fn read_output(path: &Path) -> Result<Vec<csv::StringRecord>, TileError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| TileError::CsvError(e.to_string()))?;
        let mut rows = vec![
            reader
                .headers()
                .map_err(|e| TileError::CsvError(e.to_string()))?
                .clone(),
        ];
        for record in reader.records() {
            rows.push(record.map_err(|e| TileError::CsvError(e.to_string()))?);
        }
        Ok(rows)
    }

    #[test]
    fn test_csv_geojson_point() -> Result<(), TileError> {
        let dir = tempdir().map_err(io_err)?;
        let csv_path = dir.path().join("test.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(io_err)?;
        writeln!(file, "ASSET_ID,TYPE,geometry").map_err(io_err)?;
        writeln!(
            file,
            "SF1,Cafe,\"{{\"\"type\"\":\"\"Point\"\",\"\"coordinates\"\":[-122.4,37.7]}}\""
        )
        .map_err(io_err)?;

        let config = CsvTileConfig::new("geometry", 15);
        let written = csv_to_tile_csv(&csv_path, &output_path, &config)?;
        assert_eq!(written, 1);

        let rows = read_output(&output_path)?;
        assert_eq!(&rows[0], &csv::StringRecord::from(vec!["tile", "ASSET_ID", "TYPE"]));
        let expected = Tile::from_wgs84(&(-122.4, 37.7), 15)?.ordinal().to_string();
        assert_eq!(rows[1].get(0), Some(expected.as_str()));
        assert_eq!(rows[1].get(1), Some("SF1"));
        Ok(())
    }

    #[test]
    fn test_csv_wkt_polygon_expands_rows() -> Result<(), TileError> {
        let dir = tempdir().map_err(io_err)?;
        let csv_path = dir.path().join("test.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(io_err)?;
        writeln!(file, "NAME,geometry").map_err(io_err)?;
        writeln!(
            file,
            "park,\"POLYGON((-118.45 34.05,-118.35 34.05,-118.35 34.12,-118.45 34.05))\""
        )
        .map_err(io_err)?;

        let config = CsvTileConfig::new("geometry", 14).encoding(TileEncoding::Quadkey);
        let written = csv_path.to_tile_csv(&output_path, &config)?;
        assert!(written > 1);

        let rows = read_output(&output_path)?;
        assert_eq!(rows.len(), written + 1);
        for row in &rows[1..] {
            let key = row.get(0).unwrap_or_default();
            assert_eq!(key.len(), 14);
            assert!(key.starts_with("0230"));
            assert_eq!(row.get(1), Some("park"));
        }
        Ok(())
    }

    #[test]
    fn test_csv_from_coords_excludes_source_columns() -> Result<(), TileError> {
        let dir = tempdir().map_err(io_err)?;
        let csv_path = dir.path().join("test.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(io_err)?;
        writeln!(file, "ID,Longitude,Latitude,Description,Notes").map_err(io_err)?;
        writeln!(file, "1,-118.4065,34.0901,Beverly Hills,a").map_err(io_err)?;
        writeln!(file, "2,-122.4,37.7,San Francisco,b").map_err(io_err)?;

        let config = CsvTileConfig::from_coords("Longitude", "Latitude", 12)
            .exclude(vec!["Notes".into()]);
        let written = csv_to_tile_csv(&csv_path, &output_path, &config)?;
        assert_eq!(written, 2);

        let output = std::fs::read_to_string(&output_path).map_err(io_err)?;
        assert!(output.starts_with("tile,ID,Description\n"));
        assert!(!output.contains("Longitude"));
        assert!(!output.contains("Notes"));
        Ok(())
    }

    #[test]
    fn test_csv_tile_geometry_columns() -> Result<(), TileError> {
        let dir = tempdir().map_err(io_err)?;
        let csv_path = dir.path().join("test.csv");

        let mut file = File::create(&csv_path).map_err(io_err)?;
        writeln!(file, "ID,lng,lat").map_err(io_err)?;
        writeln!(file, "1,2.35,48.85").map_err(io_err)?;

        let wkt_path = dir.path().join("wkt.csv");
        let config =
            CsvTileConfig::from_coords("lng", "lat", 10).with_tile_geometry(GeometryFormat::Wkt);
        csv_to_tile_csv(&csv_path, &wkt_path, &config)?;
        let rows = read_output(&wkt_path)?;
        assert_eq!(rows[0].get(1), Some("tile_geometry"));
        assert!(rows[1].get(1).unwrap_or_default().starts_with("POLYGON"));

        let json_path = dir.path().join("json.csv");
        let config = CsvTileConfig::from_coords("lng", "lat", 10)
            .with_tile_geometry(GeometryFormat::GeoJson);
        csv_to_tile_csv(&csv_path, &json_path, &config)?;
        let rows = read_output(&json_path)?;
        assert!(rows[1].get(1).unwrap_or_default().contains("\"Polygon\""));
        Ok(())
    }

    #[test]
    fn test_csv_skips_empty_coordinates() -> Result<(), TileError> {
        let dir = tempdir().map_err(io_err)?;
        let csv_path = dir.path().join("test.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(io_err)?;
        writeln!(file, "ID,lng,lat").map_err(io_err)?;
        writeln!(file, "1,,").map_err(io_err)?;
        writeln!(file, "2,-0.12,51.5").map_err(io_err)?;

        let config = CsvTileConfig::from_coords("lng", "lat", 10);
        assert_eq!(csv_to_tile_csv(&csv_path, &output_path, &config)?, 1);
        Ok(())
    }

    #[test]
    fn test_csv_errors() -> Result<(), TileError> {
        let dir = tempdir().map_err(io_err)?;
        let csv_path = dir.path().join("test.csv");
        let output_path = dir.path().join("output.csv");

        let mut file = File::create(&csv_path).map_err(io_err)?;
        writeln!(file, "ID,lng,lat").map_err(io_err)?;
        writeln!(file, "1,abc,51.5").map_err(io_err)?;

        let missing = CsvTileConfig::from_coords("x", "lat", 10);
        assert!(matches!(
            csv_to_tile_csv(&csv_path, &output_path, &missing),
            Err(TileError::CsvError(_))
        ));

        let bad_value = CsvTileConfig::from_coords("lng", "lat", 10);
        assert!(matches!(
            csv_to_tile_csv(&csv_path, &output_path, &bad_value),
            Err(TileError::CsvError(_))
        ));

        let bad_precision = CsvTileConfig::from_coords("lng", "lat", 31);
        assert_eq!(
            csv_to_tile_csv(&csv_path, &output_path, &bad_precision),
            Err(TileError::InvalidPrecision(31))
        );

        let no_input = CsvTileConfig::from_coords("lng", "lat", 10);
        assert!(matches!(
            csv_to_tile_csv(dir.path().join("absent.csv"), &output_path, &no_input),
            Err(TileError::IoError(_))
        ));
        Ok(())
    }
}
