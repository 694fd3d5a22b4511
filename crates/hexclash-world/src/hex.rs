//! Axial hex coordinate arithmetic.
//!
//! Pure functions, no state. The planner calls these concurrently for every
//! agent, and the browser client shares the same metric for its view radius.
//!
//! # Directions
//!
//! The six unit steps are enumerated in a fixed order:
//!
//! | Index | `(dq, dr)` |
//! |-------|------------|
//! | 0 | `(+1, 0)` |
//! | 1 | `(+1, -1)` |
//! | 2 | `(0, -1)` |
//! | 3 | `(-1, 0)` |
//! | 4 | `(-1, +1)` |
//! | 5 | `(0, +1)` |
//!
//! The order is part of the contract: policy scoring keeps the first of
//! several equally good neighbors.

use hexclash_types::{Bounds, Position};

/// The six unit steps of the axial grid, in enumeration order.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Default hex radius in pixels used by the browser renderer.
pub const HEX_SIZE: f64 = 32.0;

/// Axial hex distance between two tiles.
///
/// `(|dq| + |dr| + |dq + dr|) / 2`. The numerator is always even for
/// integer inputs, so the division is exact. Computed in 64-bit so extreme
/// coordinates cannot overflow.
pub const fn distance(a: Position, b: Position) -> u64 {
    let dq = (b.q as i64).saturating_sub(a.q as i64);
    let dr = (b.r as i64).saturating_sub(a.r as i64);
    dq.unsigned_abs()
        .saturating_add(dr.unsigned_abs())
        .saturating_add(dq.saturating_add(dr).unsigned_abs())
        / 2
}

/// The neighbors of `p` in [`DIRECTIONS`] order.
///
/// Always six tiles, except at the edge of the `i32` coordinate range where
/// steps that would overflow are skipped.
pub fn neighbors(p: Position) -> impl Iterator<Item = Position> {
    DIRECTIONS
        .into_iter()
        .filter_map(move |(dq, dr)| p.offset(dq, dr))
}

/// Whether `p` lies inside `bounds`. Absent bounds mean unbounded.
pub const fn in_bounds(p: Position, bounds: Option<&Bounds>) -> bool {
    match bounds {
        Some(b) => b.contains(p),
        None => true,
    }
}

/// Project a tile to pixel space for a flat-top layout.
///
/// `x = size * 3/2 * q`, `y = size * sqrt(3) * (r + q/2)`.
pub fn hex_to_pixel(p: Position, size: f64) -> (f64, f64) {
    let q = f64::from(p.q);
    let r = f64::from(p.r);
    let x = size * (1.5 * q);
    let y = size * (3.0_f64.sqrt() * (r + q / 2.0));
    (x, y)
}
