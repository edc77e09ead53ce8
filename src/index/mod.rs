pub mod constants;
pub mod coverage;
pub mod proximity;
pub mod quadkey;
pub mod ranges;

pub use constants::{
    CIRCUMFERENCE, DEFAULT_PRECISION, DEFAULT_TILE_LIMIT, EARTH_RADIUS, MAX_PRECISION,
};
pub use coverage::{coverage, coverage_of_line};
pub use proximity::{Within, select_tiles, zoom_out};
pub use quadkey::{grid_to_tile, tile_to_grid};
pub use ranges::{TileRange, prefix, ranges};
