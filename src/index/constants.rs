use std::f64::consts::PI;

/// Equatorial radius of the WGS84 ellipsoid, used as the sphere radius in meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Projected circumference of the earth in meters (width of the Mercator square).
pub const CIRCUMFERENCE: f64 = 2.0 * PI * EARTH_RADIUS;

/// Half the circumference; valid projected coordinates lie within +/- this bound.
pub const HALF_CIRCUMFERENCE: f64 = CIRCUMFERENCE / 2.0;

/// Maximum precision (zoom level).
///
/// A tile ordinal at this precision needs `2 * MAX_PRECISION` bits, which keeps
/// scaled ordinals inside a signed 64-bit numeric field.
pub const MAX_PRECISION: u8 = 30;

/// Precision used by fields when none is configured.
pub const DEFAULT_PRECISION: u8 = 30;

/// Default term budget for proximity queries.
pub const DEFAULT_TILE_LIMIT: usize = 4;

/// Number of children of every tile.
pub const BRANCHING: u64 = 4;
