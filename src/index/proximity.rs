//! Breadth-first quadtree refinement around a point.

use crate::coord::MercatorPoint;
use crate::index::constants::{BRANCHING, MAX_PRECISION};
use crate::tile::Tile;
use std::collections::BTreeMap;

/// Tile sets of increasing zoom whose tiles lie within a radius of a center.
///
/// Starting from the root, every step replaces each candidate by its four
/// subtiles and keeps those whose [`Tile::distance`] to the center is at most
/// the radius. One set is yielded per zoom level `1..=max_zoom`, in quadkey
/// order. The closest point of a kept tile always lies in one of its children,
/// so set sizes never decrease; a pruned tile's descendants never return.
///
/// `max_zoom` is capped at [`MAX_PRECISION`], the longest key a tile can have.
///
/// If a level comes out empty (the center is farther than the radius from
/// the whole world square) the empty set is yielded once and iteration ends.
/// Created by [`MercatorPoint::within`].
#[derive(Debug, Clone)]
pub struct Within {
    center: MercatorPoint,
    distance: f64,
    max_zoom: u8,
    tiles: Vec<Tile>,
    done: bool,
}

impl Within {
    pub(crate) fn new(center: MercatorPoint, distance: f64, max_zoom: u8) -> Self {
        Self {
            center,
            distance,
            max_zoom: max_zoom.min(MAX_PRECISION),
            tiles: vec![Tile::root()],
            done: false,
        }
    }
}

impl Iterator for Within {
    type Item = Vec<Tile>;

    fn next(&mut self) -> Option<Vec<Tile>> {
        let zoom = self.tiles.first().map_or(0, Tile::precision);
        if self.done || zoom >= self.max_zoom {
            return None;
        }

        let (center, distance) = (self.center, self.distance);
        self.tiles = self
            .tiles
            .iter()
            .flat_map(Tile::subtiles)
            .filter(|subtile| subtile.distance(&center) <= distance)
            .collect();
        if self.tiles.is_empty() {
            self.done = true;
        }
        Some(self.tiles.clone())
    }
}

/// Picks the last tile set whose size is within `limit`.
///
/// This is the coarsest precision that respects the budget without losing
/// more area than needed. The budget is soft: if the first set already
/// exceeds it, the first set is returned anyway. An exhausted iterator gives
/// an empty set.
pub fn select_tiles<I>(sets: I, limit: usize) -> Vec<Tile>
where
    I: IntoIterator<Item = Vec<Tile>>,
{
    let mut sets = sets.into_iter();
    let Some(mut chosen) = sets.next() else {
        return Vec::new();
    };
    if chosen.len() > limit {
        log::warn!(
            "{} tiles at precision 1 exceed the limit of {}; using them anyway",
            chosen.len(),
            limit
        );
        return chosen;
    }
    for tiles in sets {
        if tiles.len() > limit {
            break;
        }
        chosen = tiles;
    }
    log::debug!(
        "selected {} tiles at precision {}",
        chosen.len(),
        chosen.first().map_or(0, Tile::precision)
    );
    chosen
}

/// Reduces a tile set by zooming out wherever all four siblings are present.
///
/// Repeats until no complete sibling group remains, so the result may mix
/// precisions. It covers exactly the same area as the input. Output is
/// sorted by key; duplicates in the input are ignored.
pub fn zoom_out<I>(tiles: I) -> Vec<Tile>
where
    I: IntoIterator<Item = Tile>,
{
    let mut result = Vec::new();
    let mut current: Vec<Tile> = tiles.into_iter().collect();
    current.sort();
    current.dedup();

    while !current.is_empty() {
        let mut groups: BTreeMap<Option<Tile>, Vec<Tile>> = BTreeMap::new();
        for tile in current {
            groups.entry(tile.parent()).or_default().push(tile);
        }

        let mut parents = Vec::new();
        for (parent, children) in groups {
            match parent {
                Some(parent) if children.len() as u64 == BRANCHING => parents.push(parent),
                _ => result.extend(children),
            }
        }
        current = parents;
    }

    result.sort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TileError;
    use std::collections::BTreeSet;

    fn center() -> Result<MercatorPoint, TileError> {
        MercatorPoint::from_lng_lat(-122.4, 37.7)
    }

    #[test]
    fn test_first_level_is_root_subtiles() -> Result<(), TileError> {
        let mut sets = center()?.within(1000.0, 20);
        let first = sets.next().unwrap_or_default();
        // far from the equator and the meridian, so only the enclosing quadrant survives
        assert_eq!(first, vec![center()?.tile(1)]);
        Ok(())
    }

    #[test]
    fn test_huge_radius_keeps_all_root_subtiles() -> Result<(), TileError> {
        let first = center()?.within(1e8, 20).next().unwrap_or_default();
        assert_eq!(first, Tile::root().subtiles().to_vec());
        Ok(())
    }

    #[test]
    fn test_yields_one_set_per_zoom() -> Result<(), TileError> {
        let sets: Vec<Vec<Tile>> = center()?.within(1000.0, 20).collect();
        assert_eq!(sets.len(), 20);
        for (i, tiles) in sets.iter().enumerate() {
            assert!(tiles.iter().all(|t| t.precision() as usize == i + 1));
        }
        Ok(())
    }

    #[test]
    fn test_monotonic_refinement() -> Result<(), TileError> {
        let point = center()?;
        let sets: Vec<Vec<Tile>> = point.within(1000.0, 20).collect();

        for pair in sets.windows(2) {
            let (coarse, fine) = (&pair[0], &pair[1]);
            assert!(fine.len() >= coarse.len());
            let parents: BTreeSet<Tile> = coarse.iter().cloned().collect();
            for tile in fine {
                let parent = tile.parent().unwrap_or_else(Tile::root);
                assert!(parents.contains(&parent));
                assert!(tile.distance(&point) <= 1000.0);
            }
        }

        // the enclosing tile is always kept
        assert!(sets[9].contains(&point.tile(10)));
        assert!(sets[9].len() >= sets[8].len());
        Ok(())
    }

    #[test]
    fn test_zero_radius_keeps_enclosing_tile() -> Result<(), TileError> {
        let point = center()?;
        let sets: Vec<Vec<Tile>> = point.within(0.0, 12).collect();
        assert_eq!(sets.len(), 12);
        let last = sets.last().cloned().unwrap_or_default();
        assert!(last.contains(&point.tile(12)));
        Ok(())
    }

    #[test]
    fn test_point_outside_world_terminates_early() -> Result<(), TileError> {
        // far above the square's top edge, with a radius that cannot reach it
        let point = MercatorPoint::from_lng_lat(0.0, 89.9)?;
        let sets: Vec<Vec<Tile>> = point.within(1000.0, 10).collect();
        assert_eq!(sets, vec![Vec::<Tile>::new()]);
        Ok(())
    }

    #[test]
    fn test_max_zoom_is_capped() -> Result<(), TileError> {
        let sets: Vec<Vec<Tile>> = center()?.within(1.0, 40).collect();
        assert_eq!(sets.len(), usize::from(MAX_PRECISION));
        assert!(sets.iter().flatten().all(|t| t.precision() <= MAX_PRECISION));
        Ok(())
    }

    #[test]
    fn test_max_zoom_zero_yields_nothing() -> Result<(), TileError> {
        assert_eq!(center()?.within(1000.0, 0).count(), 0);
        Ok(())
    }

    #[test]
    fn test_select_tiles_respects_limit() -> Result<(), TileError> {
        let point = center()?;
        let chosen = select_tiles(point.within(1000.0, 20), 4);
        assert!(!chosen.is_empty() && chosen.len() <= 4);

        // it is the finest set within the limit
        let sets: Vec<Vec<Tile>> = point.within(1000.0, 20).collect();
        let index = sets.iter().position(|s| *s == chosen).unwrap_or(usize::MAX);
        assert!(index < sets.len());
        if index + 1 < sets.len() {
            assert!(sets[index + 1].len() > 4);
        }
        Ok(())
    }

    #[test]
    fn test_select_tiles_soft_cap() {
        let first: Vec<Tile> = Tile::root().subtiles().to_vec();
        let second: Vec<Tile> = first.iter().take(2).flat_map(Tile::subtiles).collect();
        let chosen = select_tiles(vec![first.clone(), second], 1);
        assert_eq!(chosen, first);
    }

    #[test]
    fn test_select_tiles_takes_last_when_all_fit() {
        let sets = vec![
            vec![Tile::from_grid(0, 0, 1)],
            vec![Tile::from_grid(1, 1, 2)],
            vec![Tile::from_grid(2, 2, 3)],
        ];
        assert_eq!(select_tiles(sets, 4), vec![Tile::from_grid(2, 2, 3)]);
        assert!(select_tiles(Vec::<Vec<Tile>>::new(), 4).is_empty());
    }

    #[test]
    fn test_zoom_out_groups_complete_siblings() -> Result<(), TileError> {
        let parent: Tile = "0230".parse()?;
        let mut tiles: Vec<Tile> = parent.subtiles().to_vec();
        let lone: Tile = "0231".parse::<Tile>()?.subtiles()[2].clone();
        tiles.push(lone.clone());

        assert_eq!(zoom_out(tiles), vec![parent, lone]);
        Ok(())
    }

    #[test]
    fn test_zoom_out_recurses() -> Result<(), TileError> {
        let top: Tile = "12".parse()?;
        let grandchildren: Vec<Tile> = top.subtiles().iter().flat_map(Tile::subtiles).collect();
        assert_eq!(grandchildren.len(), 16);
        assert_eq!(zoom_out(grandchildren), vec![top]);

        let everything: Vec<Tile> = Tile::root().subtiles().to_vec();
        assert_eq!(zoom_out(everything), vec![Tile::root()]);
        Ok(())
    }

    #[test]
    fn test_zoom_out_preserves_area() -> Result<(), TileError> {
        let point = center()?;
        let tiles = select_tiles(point.within(5000.0, 20), 64);
        let grouped = zoom_out(tiles.clone());
        assert!(grouped.len() <= tiles.len());

        let area = |ts: &[Tile]| ts.iter().map(|t| t.size() * t.size()).sum::<f64>();
        let (before, after) = (area(&tiles), area(&grouped));
        assert!((before - after).abs() <= before * 1e-9);

        for tile in &tiles {
            assert!(grouped.iter().any(|g| g.is_ancestor_of(tile)));
        }
        Ok(())
    }
}
