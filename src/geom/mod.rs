mod format;
mod polygon;

pub use format::{GeometryFormat, parse_geojson, parse_geometry, parse_wkt};
pub use polygon::{create_tile_polygon, mercator_rect};
