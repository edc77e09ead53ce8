//! Bit interleaving between grid coordinates and quadkey digits.
//!
//! This is the only place that knows the digit ordering. Each digit is
//! `x_bit + 2 * (1 - y_bit)`, most significant level first, with `y` counted
//! from the bottom of the world (TMS convention). Everything else goes
//! through [`grid_to_tile`] and [`tile_to_grid`].

use crate::error::TileError;
use crate::index::constants::MAX_PRECISION;

/// Interleaves grid coordinates into a quadkey of `zoom` digits.
///
/// # Panics
///
/// Panics if `zoom > MAX_PRECISION` or either coordinate is `>= 2^zoom`.
pub fn grid_to_tile(x: u32, y: u32, zoom: u8) -> String {
    assert!(zoom <= MAX_PRECISION, "zoom {zoom} exceeds {MAX_PRECISION}");
    let size = 1u64 << zoom;
    assert!(
        u64::from(x) < size && u64::from(y) < size,
        "grid ({x}, {y}) outside zoom {zoom}"
    );

    (0..zoom)
        .rev()
        .map(|level| {
            let x_bit = (x >> level) & 1;
            let y_bit = (y >> level) & 1;
            let digit = x_bit + 2 * (1 - y_bit);
            char::from(b'0' + digit as u8)
        })
        .collect()
}

/// De-interleaves a quadkey back into grid coordinates.
///
/// The key must already be validated with [`validate_key`].
pub fn tile_to_grid(key: &str) -> (u32, u32) {
    let zoom = key.len() as u32;
    let (mut x, mut flipped) = (0u32, 0u32);
    for byte in key.bytes() {
        let digit = u32::from(byte - b'0');
        x = (x << 1) | (digit & 1);
        flipped = (flipped << 1) | (digit >> 1);
    }
    let top = if zoom == 0 { 0 } else { (1u32 << zoom) - 1 };
    (x, top - flipped)
}

/// Checks that a key has only base-4 digits and fits [`MAX_PRECISION`].
pub fn validate_key(key: &str) -> Result<(), TileError> {
    if key.len() > MAX_PRECISION as usize {
        return Err(TileError::InvalidTile(key.to_string()));
    }
    if !key.bytes().all(|b| (b'0'..=b'3').contains(&b)) {
        return Err(TileError::InvalidTile(key.to_string()));
    }
    Ok(())
}

/// Base-4 integer value of a validated key.
pub fn key_to_ordinal(key: &str) -> u64 {
    key.bytes()
        .fold(0u64, |acc, b| (acc << 2) | u64::from(b - b'0'))
}
