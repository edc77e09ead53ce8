//! Compaction of same-precision tiles into contiguous ordinal intervals.
//!
//! Ordinals live in the key space of a field's reference precision: a tile of
//! length `p` maps to `base4(tile) * 4^(reference - p)`, the first ordinal of
//! its descendants at the reference precision. A tile then spans exactly
//! `4^(reference - p)` consecutive ordinals.

use crate::error::TileError;
use crate::index::constants::{BRANCHING, MAX_PRECISION};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, stop)` of tile ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileRange {
    pub start: u64,
    pub stop: u64,
}

impl TileRange {
    pub fn new(start: u64, stop: u64) -> Self {
        Self { start, stop }
    }

    /// Number of ordinals covered.
    pub fn len(&self) -> u64 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub fn contains(&self, ordinal: u64) -> bool {
        self.start <= ordinal && ordinal < self.stop
    }
}

/// Width in ordinals of one tile of `precision` within `reference` precision.
pub fn step(precision: u8, reference: u8) -> Result<u64, TileError> {
    if reference > MAX_PRECISION {
        return Err(TileError::InvalidPrecision(reference));
    }
    if precision > reference {
        return Err(TileError::InvalidPrecision(precision));
    }
    Ok(BRANCHING.pow(u32::from(reference - precision)))
}

/// Merges tiles of one precision into the fewest ascending intervals.
///
/// Input order does not matter and duplicates are ignored. Adjacent tiles
/// (ordinals exactly one step apart) merge into a single interval, so no two
/// emitted intervals touch.
///
/// # Errors
///
/// [`TileError::MixedPrecision`] if the tiles differ in length and
/// [`TileError::InvalidPrecision`] if they are longer than `reference`.
///
/// # Example
/// ```
/// use quadtile::{Tile, TileRange, ranges};
///
/// # fn main() -> Result<(), quadtile::TileError> {
/// let tiles: Vec<Tile> = ["01", "02", "03", "12"]
///     .iter()
///     .map(|k| k.parse())
///     .collect::<Result<_, _>>()?;
/// let merged = ranges(&tiles, 2)?;
/// assert_eq!(merged, vec![TileRange::new(1, 4), TileRange::new(6, 7)]);
/// # Ok(())
/// # }
/// ```
pub fn ranges(tiles: &[Tile], reference: u8) -> Result<Vec<TileRange>, TileError> {
    let Some(first) = tiles.first() else {
        return Ok(Vec::new());
    };
    let precision = first.precision();
    if let Some(other) = tiles.iter().find(|t| t.precision() != precision) {
        return Err(TileError::MixedPrecision(
            precision as usize,
            other.precision() as usize,
        ));
    }
    let step = step(precision, reference)?;

    let mut ordinals: Vec<u64> = tiles.iter().map(|t| t.ordinal() * step).collect();
    ordinals.sort_unstable();
    ordinals.dedup();

    let mut merged: Vec<TileRange> = Vec::new();
    for ordinal in ordinals {
        match merged.last_mut() {
            Some(last) if last.stop == ordinal => last.stop = ordinal + step,
            _ => merged.push(TileRange::new(ordinal, ordinal + step)),
        }
    }
    Ok(merged)
}

/// Interval matching a tile and all of its descendants.
pub fn prefix(tile: &Tile, reference: u8) -> Result<TileRange, TileError> {
    let step = step(tile.precision(), reference)?;
    let start = tile.ordinal() * step;
    Ok(TileRange::new(start, start + step))
}
