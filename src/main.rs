use clap::{Parser, Subcommand};
use quadtile::{
    CsvTileConfig, GeometryFormat, MercatorPoint, PointField, Tile, TileEncoding, TileError,
    csv_to_tile_csv, select_tiles, zoom_out,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "quadtile")]
#[command(about = "Quadtree tile encoding and proximity search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the tile enclosing a point
    Tile {
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, default_value_t = 15)]
        precision: u8,
    },
    /// Print a KML document visualizing a tile search around a point
    Within {
        #[arg(long, default_value_t = -118.3004, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, default_value_t = 34.1184, allow_hyphen_values = true)]
        lat: f64,
        /// Search radius in meters
        #[arg(long, default_value_t = 1000.0)]
        distance: f64,
        /// Maximum number of tiles to consider
        #[arg(long, default_value_t = 4)]
        tiles: usize,
    },
    /// Print the backend query for a proximity search as JSON
    Query {
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, default_value_t = 1000.0)]
        distance: f64,
        #[arg(long, default_value = "tile")]
        field: String,
        #[arg(long, default_value_t = quadtile::DEFAULT_PRECISION)]
        precision: u8,
        #[arg(long, default_value_t = quadtile::DEFAULT_TILE_LIMIT)]
        tiles: usize,
        /// Query quadkey prefixes instead of ordinal ranges
        #[arg(long)]
        quadkey: bool,
    },
    /// Convert a CSV of points or geometries into a CSV of tiles
    Csv {
        input: PathBuf,
        output: PathBuf,
        /// Geometry column (WKT or GeoJSON)
        #[arg(long)]
        geometry: Option<String>,
        #[arg(long, default_value = "lng")]
        lng_column: String,
        #[arg(long, default_value = "lat")]
        lat_column: String,
        #[arg(long, default_value_t = 15)]
        precision: u8,
        /// Write quadkeys instead of ordinals
        #[arg(long)]
        quadkey: bool,
        /// Include the tile outline as WKT
        #[arg(long)]
        tile_geometry: bool,
        /// Columns to leave out of the output
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },
}

const KML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
<Folder>"#;

fn ground_overlay(tile: &Tile) -> String {
    let bounds = tile.bounds();
    format!(
        "<GroundOverlay>\n<color>7fff0000</color>\n<drawOrder>1</drawOrder>\n<LatLonBox>\n\
         <north>{}</north>\n<south>{}</south>\n<east>{}</east>\n<west>{}</west>\n\
         </LatLonBox>\n</GroundOverlay>",
        bounds.max().y,
        bounds.min().y,
        bounds.max().x,
        bounds.min().x
    )
}

fn kml_document(lng: f64, lat: f64, tiles: &[Tile]) -> String {
    let mut doc = String::from(KML_HEADER);
    doc.push_str(&format!(
        "\n<Placemark>\n<Point>\n<coordinates>\n{lng},{lat}\n</coordinates>\n</Point>\n</Placemark>\n"
    ));
    for tile in tiles {
        doc.push_str(&ground_overlay(tile));
        doc.push('\n');
    }
    doc.push_str("</Folder>\n</kml>");
    doc
}

fn within(lng: f64, lat: f64, distance: f64, limit: usize) -> Result<String, TileError> {
    let center = MercatorPoint::from_lng_lat(lng, lat)?;
    let tiles = select_tiles(center.within(distance, quadtile::MAX_PRECISION), limit);
    log::info!(
        "{} tiles at precision {}",
        tiles.len(),
        tiles.first().map_or(0, Tile::precision)
    );

    let grouped = zoom_out(tiles);
    let area: f64 = grouped.iter().map(|t| t.size() * t.size()).sum();
    log::info!(
        "{} grouped tiles covering {} times the circle area",
        grouped.len(),
        area / (std::f64::consts::PI * distance * distance)
    );
    Ok(kml_document(lng, lat, &grouped))
}

fn query_json(
    field: &PointField,
    lng: f64,
    lat: f64,
    distance: f64,
    limit: usize,
) -> Result<String, TileError> {
    let query = field.within(&(lng, lat), distance, limit)?;
    log::info!("{} clauses: {}", query.clause_count(), query);
    serde_json::to_string_pretty(&query).map_err(|e| TileError::IoError(e.to_string()))
}

fn main() -> Result<(), TileError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Tile {
            lng,
            lat,
            precision,
        } => {
            let tile = Tile::from_wgs84(&(lng, lat), precision)?;
            let bounds = tile.bounds();
            println!("Quadkey: {tile}");
            println!("Ordinal: {}", tile.ordinal());
            println!("Grid: {:?}", tile.coords());
            println!(
                "Bounds: ({}, {}) - ({}, {})",
                bounds.min().x,
                bounds.min().y,
                bounds.max().x,
                bounds.max().y
            );
        }
        Commands::Within {
            lng,
            lat,
            distance,
            tiles,
        } => {
            println!("{}", within(lng, lat, distance, tiles)?);
        }
        Commands::Query {
            lng,
            lat,
            distance,
            field,
            precision,
            tiles,
            quadkey,
        } => {
            let encoding = if quadkey {
                TileEncoding::Quadkey
            } else {
                TileEncoding::Ordinal
            };
            let field = PointField::builder()
                .name(field)
                .precision(precision)
                .encoding(encoding)
                .build()?;
            println!("{}", query_json(&field, lng, lat, distance, tiles)?);
        }
        Commands::Csv {
            input,
            output,
            geometry,
            lng_column,
            lat_column,
            precision,
            quadkey,
            tile_geometry,
            exclude,
        } => {
            let mut config = match geometry {
                Some(column) => CsvTileConfig::new(column, precision),
                None => CsvTileConfig::from_coords(lng_column, lat_column, precision),
            }
            .exclude(exclude);
            if quadkey {
                config = config.encoding(TileEncoding::Quadkey);
            }
            if tile_geometry {
                config = config.with_tile_geometry(GeometryFormat::Wkt);
            }
            let written = csv_to_tile_csv(&input, &output, &config)?;
            log::info!("wrote {} tile rows to {}", written, output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_within_kml() -> Result<(), TileError> {
        let kml = within(-118.3004, 34.1184, 1000.0, 4)?;
        assert!(kml.starts_with("<?xml"));
        assert!(kml.contains("-118.3004,34.1184"));
        let overlays = kml.matches("<GroundOverlay>").count();
        assert!((1..=4).contains(&overlays));
        assert!(kml.ends_with("</kml>"));
        Ok(())
    }

    #[test]
    fn test_query_json() -> Result<(), TileError> {
        let field = PointField::new("location", 15)?;
        let json = query_json(&field, -118.4065, 34.0901, 1e8, 4)?;
        assert!(json.contains("\"type\": \"range\""));
        assert!(json.contains("\"field\": \"location\""));
        Ok(())
    }
}
