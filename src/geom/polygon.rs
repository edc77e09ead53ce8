use crate::coord::MercatorPoint;
use geo_types::{Coord, LineString, Polygon, Rect, coord};

/// Builds the closed outline of a rectangle, counter-clockwise from its minimum corner.
pub fn create_tile_polygon(rect: &Rect<f64>) -> Polygon<f64> {
    let (min, max) = (rect.min(), rect.max());
    let coords: Vec<Coord<f64>> = vec![
        min,
        coord! { x: max.x, y: min.y },
        max,
        coord! { x: min.x, y: max.y },
        min,
    ];
    Polygon::new(LineString::from(coords), vec![])
}

/// Rectangle between two projected corners.
pub fn mercator_rect(lower: MercatorPoint, upper: MercatorPoint) -> Rect<f64> {
    Rect::new(
        coord! { x: lower.x, y: lower.y },
        coord! { x: upper.x, y: upper.y },
    )
}
