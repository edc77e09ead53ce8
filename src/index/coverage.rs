use crate::coord::{Coordinate, MercatorPoint, project};
use crate::error::TileError;
use crate::index::constants::MAX_PRECISION;
use crate::tile::Tile;
use geo::BoundingRect;
use geo_types::{Coord, LineString};
use std::collections::BTreeSet;

/// Returns every tile at `precision` overlapping the bounding box of a ring of
/// WGS84 points.
///
/// The bounding box over-covers the ring but never misses any part of it.
/// Exact point-in-polygon filtering, if needed, belongs after the search.
///
/// # Example
/// ```
/// use quadtile::coverage;
///
/// # fn main() -> Result<(), quadtile::TileError> {
/// let ring = [(-122.5, 37.7), (-122.4, 37.7), (-122.4, 37.8), (-122.5, 37.7)];
/// let tiles = coverage(&ring, 12)?;
/// assert!(tiles.len() > 1);
/// # Ok(())
/// # }
/// ```
pub fn coverage<C: Coordinate>(
    points: &[C],
    precision: u8,
) -> Result<BTreeSet<Tile>, TileError> {
    if precision > MAX_PRECISION {
        return Err(TileError::InvalidPrecision(precision));
    }
    let projected = points
        .iter()
        .map(|c| project(c).map(|p| Coord { x: p.x, y: p.y }))
        .collect::<Result<LineString<f64>, _>>()?;
    let rect = projected.bounding_rect().ok_or(TileError::EmptyPolygon)?;

    let lower = MercatorPoint::new(rect.min().x, rect.min().y).tile(precision);
    let upper = MercatorPoint::new(rect.max().x, rect.max().y).tile(precision);
    Ok(lower.walk(&upper).collect())
}

/// Coverage of a WGS84 line string's bounding box.
pub fn coverage_of_line(
    line: &LineString<f64>,
    precision: u8,
) -> Result<BTreeSet<Tile>, TileError> {
    coverage(&line.0, precision)
}
