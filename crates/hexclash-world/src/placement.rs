//! Spawn-tile selection for agents joining the world.

use std::collections::BTreeSet;

use hexclash_types::{Bounds, Position};
use rand::Rng;

use crate::error::WorldError;

/// Pick a uniformly random tile in `bounds` that is not in `occupied`.
///
/// Up to `attempts` random draws are made. If every draw lands on an
/// occupied tile, the region is scanned in [`Bounds::tiles`] order and the
/// first free tile is returned, so a join only fails when the world is
/// genuinely full.
///
/// # Errors
///
/// Returns [`WorldError::InvalidBounds`] for empty bounds and
/// [`WorldError::NoFreeTile`] when every tile is occupied.
pub fn random_free_tile(
    bounds: &Bounds,
    occupied: &BTreeSet<Position>,
    rng: &mut impl Rng,
    attempts: u64,
) -> Result<Position, WorldError> {
    if !bounds.is_valid() {
        return Err(WorldError::InvalidBounds(*bounds));
    }

    for _ in 0..attempts {
        let q = rng.random_range(bounds.min_q..=bounds.max_q);
        let r = rng.random_range(bounds.min_r..=bounds.max_r);
        let candidate = Position::new(q, r);
        if !occupied.contains(&candidate) {
            return Ok(candidate);
        }
    }

    bounds
        .tiles()
        .find(|p| !occupied.contains(p))
        .ok_or(WorldError::NoFreeTile {
            tiles: bounds.tile_count(),
        })
}
