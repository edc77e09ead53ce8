//! # quadtile
//!
//! Quadtree tiles over the spherical Mercator plane, for indexing points and
//! polygons in a text search backend. Tiles are base-4 keys: each digit picks
//! one quadrant of its parent, so every tile's key is a prefix of its
//! descendants' keys and a region query becomes prefix or range lookups.
//!
//! There are currently four main entry points.
//!
//! ### 1. `Tile` - Single Tile Operations
//!
//! ```
//! use quadtile::Tile;
//!
//! # fn main() -> Result<(), quadtile::TileError> {
//! let tile = Tile::from_wgs84(&(-118.4065, 34.0901), 15)?;
//! assert!(tile.key().starts_with("0230"));
//! let polygon = tile.to_polygon();
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. `MercatorPoint::within` - Proximity Search
//!
//! ```
//! use quadtile::{MercatorPoint, ranges, select_tiles};
//!
//! # fn main() -> Result<(), quadtile::TileError> {
//! let center = MercatorPoint::from_lng_lat(-122.4, 37.7)?;
//! let tiles = select_tiles(center.within(1000.0, 20), 4);
//! let intervals = ranges(&tiles, 20)?;
//! assert!(!intervals.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. `PointField` / `PolygonField` - Index Values and Queries
//!
//! ```
//! use quadtile::{PointField, TileEncoding};
//!
//! # fn main() -> Result<(), quadtile::TileError> {
//! let field = PointField::builder()
//!     .name("location")
//!     .precision(20)
//!     .encoding(TileEncoding::Ordinal)
//!     .build()?;
//!
//! let values = field.items(&[(-122.4, 37.7)])?;
//! let query = field.within(&(-122.4, 37.7), 1000.0, 4)?;
//! println!("{values:?} {query}");
//! # Ok(())
//! # }
//! ```
//!
//! ### 4. `CsvToTiles` - CSV File Conversion
//!
//! ```no_run
//! use quadtile::{CsvToTiles, CsvTileConfig, GeometryFormat};
//!
//! let config = CsvTileConfig::new("geometry", 15)
//!     .exclude(vec!["Geo Point".into()])
//!     .with_tile_geometry(GeometryFormat::Wkt);
//!
//! // Using trait method
//! "input.csv".to_tile_csv("output.csv", &config).unwrap();
//! ```
//!

pub mod coord;
pub mod error;
pub mod field;
pub mod geom;
pub mod index;
pub mod io;
pub mod query;
pub mod tile;

pub use coord::{Coordinate, MercatorPoint, project, unproject};
pub use error::TileError;
pub use field::{
    DistanceComparator, FieldValue, PointField, PointFieldBuilder, PolygonField, TileEncoding,
};
pub use geom::{GeometryFormat, create_tile_polygon, parse_geojson, parse_geometry, parse_wkt};
pub use index::{
    CIRCUMFERENCE, DEFAULT_PRECISION, DEFAULT_TILE_LIMIT, EARTH_RADIUS, MAX_PRECISION, TileRange,
    Within, coverage, coverage_of_line, grid_to_tile, prefix, ranges, select_tiles, tile_to_grid,
    zoom_out,
};
pub use io::{CoordinateSource, CsvTileConfig, CsvToTiles, csv_to_tile_csv};
pub use query::{BooleanOp, Query};
pub use tile::{Tile, TileWalk};

pub use geo_types;

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Contains;
    use geo_types::{Point, point};

    #[test]
    fn test_tile_decodes_to_region_containing_point() -> Result<(), TileError> {
        let point = MercatorPoint::from_lng_lat(-122.4, 37.7)?;
        let tile = point.tile(10);

        let (x, y) = tile.coords();
        assert_eq!(Tile::from_grid(x, y, 10), tile);

        assert!(tile.bounds().contains(&point! { x: -122.4, y: 37.7 }));
        assert_eq!(tile.distance(&point), 0.0);
        Ok(())
    }

    #[test]
    fn test_within_worked_example() -> Result<(), TileError> {
        let center = project(&(-122.4, 37.7))?;
        let sets: Vec<Vec<Tile>> = center.within(1000.0, 20).collect();
        assert_eq!(sets.len(), 20);

        // zoom 10 never shrinks relative to zoom 9
        assert!(sets[9].len() >= sets[8].len());
        assert!(sets[9].contains(&center.tile(10)));

        // at zoom 1 only quadrants within 1km survive: the one holding the point
        assert_eq!(sets[0], vec![center.tile(1)]);
        Ok(())
    }

    #[test]
    fn test_search_matches_indexed_document() -> Result<(), TileError> {
        let field = PointField::new("tile", 20)?;
        let doc = (-122.401, 37.701);
        let indexed = match field.items(&[doc])?.first() {
            Some(FieldValue::Ordinal(ordinal)) => *ordinal,
            other => panic!("unexpected value {other:?}"),
        };

        let tiles = select_tiles(project(&(-122.4, 37.7))?.within(1000.0, 20), 4);
        let intervals = ranges(&tiles, field.precision())?;
        assert!(intervals.iter().any(|r| r.contains(indexed)));

        let cmp = DistanceComparator::new(&(-122.4, 37.7), &[doc])?;
        assert!(cmp.distance(0).is_some_and(|d| d < 1000.0));
        Ok(())
    }

    #[test]
    fn test_polygon_search_round_trip() -> Result<(), TileError> {
        let ring = vec![
            Point::new(-122.45, 37.75),
            Point::new(-122.40, 37.75),
            Point::new(-122.40, 37.80),
            Point::new(-122.45, 37.75),
        ];
        let field = PolygonField::new(PointField::new("area", 16)?);
        let values = field.items(std::slice::from_ref(&ring))?;
        assert!(values.len() > 1);

        let query = field.within(&(-122.42, 37.77), 500.0, DEFAULT_TILE_LIMIT)?;
        assert!(query.clause_count() >= 1);
        Ok(())
    }

    #[test]
    fn test_geometry_string_to_tiles() -> Result<(), TileError> {
        let geom = parse_geometry("LINESTRING(-122.45 37.75, -122.40 37.80)")?;
        let tiles = Tile::from_geometry(&geom, 14)?;
        let direct = coverage(&[(-122.45, 37.75), (-122.40, 37.80)], 14)?;
        assert_eq!(tiles.len(), direct.len());
        Ok(())
    }
}
