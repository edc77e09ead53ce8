use crate::coord::Coordinate;
use crate::error::TileError;
use crate::index::constants::CIRCUMFERENCE;
use crate::index::proximity::Within;
use crate::tile::Tile;
use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A point in spherical Mercator (EPSG:3857) meters.
///
/// Built from geodetic longitude/latitude with [`MercatorPoint::from_lng_lat`]
/// or from tile geometry. Coordinates of points on the map lie within
/// `+/- CIRCUMFERENCE / 2` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    /// Wraps planar coordinates that are already projected.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Projects WGS84 longitude/latitude in degrees.
    ///
    /// Longitudes are not wrapped or rejected: a point beyond ±180 projects
    /// outside the world square and [`tile`](Self::tile) clamps it onto the
    /// edge tiles.
    ///
    /// # Example
    /// ```
    /// use quadtile::MercatorPoint;
    ///
    /// # fn main() -> Result<(), quadtile::TileError> {
    /// let point = MercatorPoint::from_lng_lat(-122.4, 37.7)?;
    /// let (lng, lat) = point.to_lng_lat();
    /// assert!((lng + 122.4).abs() < 1e-9 && (lat - 37.7).abs() < 1e-9);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_lng_lat(lng: f64, lat: f64) -> Result<Self, TileError> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(TileError::InvalidCoordinate(lng, lat));
        }
        if lat <= -90.0 || lat >= 90.0 {
            return Err(TileError::InvalidLatitude(lat));
        }

        let stretched = ((lat + 90.0) * PI / 360.0).tan().ln() * 180.0 / PI;
        let scale = CIRCUMFERENCE / 360.0;
        Ok(Self::new(lng * scale, stretched * scale))
    }

    /// Inverse projection back to `(longitude, latitude)` in degrees.
    pub fn to_lng_lat(&self) -> (f64, f64) {
        let scale = 360.0 / CIRCUMFERENCE;
        let lng = self.x * scale;
        let lat = (self.y * scale * PI / 180.0).exp().atan() * 360.0 / PI - 90.0;
        (lng, lat)
    }

    /// Euclidean distance in projected meters.
    ///
    /// Approximates geodesic distance well at the tile sizes a query uses,
    /// stretching with latitude like the projection itself.
    pub fn distance(&self, other: &MercatorPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the enclosing tile at the given zoom level.
    ///
    /// Points outside the Mercator square are clamped onto the edge tiles.
    ///
    /// # Panics
    ///
    /// Panics if `zoom` exceeds [`MAX_PRECISION`](crate::MAX_PRECISION).
    pub fn tile(&self, zoom: u8) -> Tile {
        let size = 2f64.powi(i32::from(zoom));
        let index = |m: f64| {
            let t = ((m / CIRCUMFERENCE + 0.5) * size).ceil() - 1.0;
            t.clamp(0.0, size - 1.0) as u32
        };
        Tile::from_grid(index(self.x), index(self.y), zoom)
    }

    /// Generates tile sets of increasing zoom whose tiles lie within `distance` meters.
    ///
    /// `max_zoom` is capped at [`MAX_PRECISION`](crate::MAX_PRECISION). See
    /// [`Within`] for the refinement rules.
    pub fn within(&self, distance: f64, max_zoom: u8) -> Within {
        Within::new(*self, distance, max_zoom)
    }
}

impl From<MercatorPoint> for Point<f64> {
    fn from(p: MercatorPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

impl From<Point<f64>> for MercatorPoint {
    fn from(p: Point<f64>) -> Self {
        MercatorPoint::new(p.x(), p.y())
    }
}

/// Projects any geodetic coordinate (x = longitude, y = latitude).
pub fn project<C: Coordinate>(coord: &C) -> Result<MercatorPoint, TileError> {
    MercatorPoint::from_lng_lat(coord.x(), coord.y())
}

/// Unprojects to a `geo_types::Point` of (longitude, latitude).
pub fn unproject(point: &MercatorPoint) -> Point<f64> {
    let (lng, lat) = point.to_lng_lat();
    Point::new(lng, lat)
}
