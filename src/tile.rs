use crate::coord::{Coordinate, MercatorPoint, project};
use crate::error::TileError;
use crate::geom::{create_tile_polygon, mercator_rect};
use crate::index::constants::{CIRCUMFERENCE, HALF_CIRCUMFERENCE, MAX_PRECISION};
use crate::index::coverage::{coverage, coverage_of_line};
use crate::index::quadkey::{grid_to_tile, key_to_ordinal, tile_to_grid, validate_key};
use geo_types::{Geometry, Polygon, Rect, coord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A single cell of the quadtree over the spherical Mercator square.
///
/// A tile is its quadkey: a string of base-4 digits whose length is the
/// precision (zoom level). The empty key is the root tile covering the whole
/// world, and appending a digit selects one of the four children.
///
/// # Example
///
/// ```
/// use quadtile::Tile;
///
/// # fn main() -> Result<(), quadtile::TileError> {
/// let tile = Tile::from_wgs84(&(-122.4, 37.7), 10)?;
/// println!("Tile: {} ({})", tile, tile.ordinal());
///
/// let (lower_left, upper_right) = tile.points();
/// assert!(lower_left.x < upper_right.x);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tile {
    key: String,
}

impl Tile {
    /// The root tile (empty key, zoom 0).
    pub fn root() -> Self {
        Self { key: String::new() }
    }

    /// Create a Tile from TMS grid coordinates.
    ///
    /// # Panics
    ///
    /// Panics unless `x < 2^zoom`, `y < 2^zoom` and `zoom <= MAX_PRECISION`.
    /// Grid coordinates always come from inside the crate, so an invalid one is a bug.
    pub fn from_grid(x: u32, y: u32, zoom: u8) -> Self {
        Self {
            key: grid_to_tile(x, y, zoom),
        }
    }

    /// Create the Tile enclosing a WGS84 (lon/lat) coordinate.
    ///
    /// # Example
    /// ```
    /// use quadtile::Tile;
    /// use geo_types::Point;
    ///
    /// # fn main() -> Result<(), quadtile::TileError> {
    /// let from_tuple = Tile::from_wgs84(&(-118.4, 34.09), 15)?;
    /// let from_point = Tile::from_wgs84(&Point::new(-118.4, 34.09), 15)?;
    /// assert_eq!(from_tuple, from_point);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_wgs84(coord: &impl Coordinate, precision: u8) -> Result<Self, TileError> {
        if precision > MAX_PRECISION {
            return Err(TileError::InvalidPrecision(precision));
        }
        Ok(project(coord)?.tile(precision))
    }

    /// Create the Tile with the given ordinal at `precision`.
    pub fn from_ordinal(ordinal: u64, precision: u8) -> Result<Self, TileError> {
        if precision > MAX_PRECISION || ordinal >> (2 * precision) != 0 {
            return Err(TileError::InvalidPrecision(precision));
        }
        let key = (0..precision)
            .rev()
            .map(|level| char::from(b'0' + ((ordinal >> (2 * level)) & 3) as u8))
            .collect();
        Ok(Self { key })
    }

    /// Create Tiles covering a WGS84 geometry at `precision`.
    ///
    /// Points become their enclosing tile. Line strings and polygons become
    /// every tile overlapping their bounding box, and multi-geometries and
    /// collections are the union of their parts. The result is sorted and
    /// free of duplicates.
    pub fn from_geometry(geom: &Geometry<f64>, precision: u8) -> Result<Vec<Self>, TileError> {
        let mut tiles = BTreeSet::new();
        collect_geometry(geom, precision, &mut tiles)?;
        Ok(tiles.into_iter().collect())
    }

    /// The quadkey.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Zoom level, i.e. the length of the key.
    pub fn precision(&self) -> u8 {
        self.key.len() as u8
    }

    /// True for the empty key, the whole world.
    pub fn is_root(&self) -> bool {
        self.key.is_empty()
    }

    /// Base-4 value of the key.
    pub fn ordinal(&self) -> u64 {
        key_to_ordinal(&self.key)
    }

    /// TMS grid coordinates `(x, y)`, with `y` counted from the bottom.
    pub fn coords(&self) -> (u32, u32) {
        tile_to_grid(&self.key)
    }

    /// Side length of the tile in projected meters.
    pub fn size(&self) -> f64 {
        CIRCUMFERENCE / 2f64.powi(i32::from(self.precision()))
    }

    /// Lower-left and upper-right corners in projected meters.
    pub fn points(&self) -> (MercatorPoint, MercatorPoint) {
        let size = self.size();
        let (x, y) = self.coords();
        let lower = MercatorPoint::new(
            f64::from(x) * size - HALF_CIRCUMFERENCE,
            f64::from(y) * size - HALF_CIRCUMFERENCE,
        );
        let upper = MercatorPoint::new(lower.x + size, lower.y + size);
        (lower, upper)
    }

    /// Bounding box in WGS84 longitude/latitude.
    pub fn bounds(&self) -> Rect<f64> {
        let (lower, upper) = self.points();
        let (west, south) = lower.to_lng_lat();
        let (east, north) = upper.to_lng_lat();
        Rect::new(coord! { x: west, y: south }, coord! { x: east, y: north })
    }

    /// Converts this tile to a polygon in WGS84 longitude/latitude,
    /// suitable for GeoJSON or WKT export.
    pub fn to_polygon(&self) -> Polygon<f64> {
        create_tile_polygon(&self.bounds())
    }

    /// Converts this tile to a polygon in projected meters.
    pub fn to_mercator_polygon(&self) -> Polygon<f64> {
        let (lower, upper) = self.points();
        create_tile_polygon(&mercator_rect(lower, upper))
    }

    /// The four tiles one level down.
    pub fn subtiles(&self) -> [Tile; 4] {
        ['0', '1', '2', '3'].map(|digit| {
            let mut key = String::with_capacity(self.key.len() + 1);
            key.push_str(&self.key);
            key.push(digit);
            Tile { key }
        })
    }

    /// The enclosing tile one level up, or `None` for the root.
    pub fn parent(&self) -> Option<Tile> {
        if self.is_root() {
            return None;
        }
        Some(Tile {
            key: self.key[..self.key.len() - 1].to_string(),
        })
    }

    /// The ancestor at `precision`, or the tile itself when already coarser.
    pub fn truncate(&self, precision: u8) -> Tile {
        let len = self.key.len().min(precision as usize);
        Tile {
            key: self.key[..len].to_string(),
        }
    }

    /// True if `other` lies within this tile (a tile contains itself).
    pub fn is_ancestor_of(&self, other: &Tile) -> bool {
        other.key.starts_with(&self.key)
    }

    /// Euclidean distance in meters from the tile's box to a point.
    ///
    /// Zero exactly when the point lies in the closed box.
    pub fn distance(&self, point: &MercatorPoint) -> f64 {
        let (lower, upper) = self.points();
        let dx = 0f64.max(lower.x - point.x).max(point.x - upper.x);
        let dy = 0f64.max(lower.y - point.y).max(point.y - upper.y);
        dx.hypot(dy)
    }

    /// Iterates every tile in the rectangle spanned by two corner tiles, inclusive.
    ///
    /// Rows run bottom to top and each row runs west to east.
    ///
    /// # Panics
    ///
    /// Panics if the tiles have different precisions.
    pub fn walk(&self, other: &Tile) -> TileWalk {
        assert_eq!(
            self.precision(),
            other.precision(),
            "walk requires tiles of one precision"
        );
        let (x0, y0) = self.coords();
        let (x1, y1) = other.coords();
        TileWalk {
            zoom: self.precision(),
            left: x0.min(x1),
            right: x0.max(x1),
            top: y0.max(y1),
            x: x0.min(x1),
            y: y0.min(y1),
            done: false,
        }
    }
}

fn collect_geometry(
    geom: &Geometry<f64>,
    precision: u8,
    tiles: &mut BTreeSet<Tile>,
) -> Result<(), TileError> {
    match geom {
        Geometry::Point(pt) => {
            tiles.insert(Tile::from_wgs84(pt, precision)?);
        }
        Geometry::MultiPoint(mp) => {
            for pt in &mp.0 {
                tiles.insert(Tile::from_wgs84(pt, precision)?);
            }
        }
        Geometry::LineString(line) => tiles.extend(coverage_of_line(line, precision)?),
        Geometry::MultiLineString(mls) => {
            for line in &mls.0 {
                tiles.extend(coverage_of_line(line, precision)?);
            }
        }
        Geometry::Polygon(poly) => tiles.extend(coverage(&poly.exterior().0, precision)?),
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                tiles.extend(coverage(&poly.exterior().0, precision)?);
            }
        }
        Geometry::Rect(rect) => {
            tiles.extend(coverage(&[rect.min(), rect.max()], precision)?);
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                collect_geometry(g, precision, tiles)?;
            }
        }
        _ => {
            return Err(TileError::UnsupportedGeometry(
                "Only points, lines, polygons and rects can be tiled".to_string(),
            ));
        }
    }
    Ok(())
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for Tile {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

impl FromStr for Tile {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_key(s)?;
        Ok(Self { key: s.to_string() })
    }
}

impl TryFrom<String> for Tile {
    type Error = TileError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        validate_key(&key)?;
        Ok(Self { key })
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.key
    }
}

/// Iterator returned by [`Tile::walk`].
#[derive(Debug, Clone)]
pub struct TileWalk {
    zoom: u8,
    left: u32,
    right: u32,
    top: u32,
    x: u32,
    y: u32,
    done: bool,
}

impl Iterator for TileWalk {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.done {
            return None;
        }
        let tile = Tile::from_grid(self.x, self.y, self.zoom);
        if self.x < self.right {
            self.x += 1;
        } else if self.y < self.top {
            self.x = self.left;
            self.y += 1;
        } else {
            self.done = true;
        }
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let width = (self.right - self.left + 1) as usize;
        let rows_left = (self.top - self.y) as usize;
        let remaining = rows_left * width + (self.right - self.x + 1) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileWalk {}
