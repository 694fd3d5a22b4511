//! Chest spawning: the resource-spawn pass of each tick.
//!
//! The target chest count scales with the area of the world and the number
//! of agents, clamped to a floor and a ceiling:
//!
//! ```text
//! tiles  = tile_count(bounds)
//! base   = tiles / tiles_per_chest
//! bonus  = agents * bonus_per_agent
//! max    = tiles / max_tiles_per_chest
//! target = max(min_chests, min(max, base + bonus))
//! ```
//!
//! Spawning draws uniformly random tiles and skips tiles that hold an agent
//! or already hold a chest. Draws are capped at
//! `to_spawn * attempts_per_chest` so a crowded world cannot stall a tick;
//! whatever is missing is retried on the next tick.
//!
//! Chests are never removed here. Collection is not part of the simulation.

use hexclash_types::{Bounds, Chest, Position, WorldState};
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::error::WorldError;

/// Density parameters for the chest spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChestDensity {
    /// One baseline chest per this many tiles.
    #[serde(default = "default_tiles_per_chest")]
    pub tiles_per_chest: u64,

    /// Extra chests per agent in the world.
    #[serde(default = "default_bonus_per_agent")]
    pub bonus_per_agent: u64,

    /// Floor on the target count.
    #[serde(default = "default_min_chests")]
    pub min_chests: u64,

    /// Ceiling: at most one chest per this many tiles.
    #[serde(default = "default_max_tiles_per_chest")]
    pub max_tiles_per_chest: u64,

    /// Random draws allowed per missing chest before giving up this tick.
    #[serde(default = "default_attempts_per_chest")]
    pub attempts_per_chest: u64,
}

impl Default for ChestDensity {
    fn default() -> Self {
        Self {
            tiles_per_chest: default_tiles_per_chest(),
            bonus_per_agent: default_bonus_per_agent(),
            min_chests: default_min_chests(),
            max_tiles_per_chest: default_max_tiles_per_chest(),
            attempts_per_chest: default_attempts_per_chest(),
        }
    }
}

const fn default_tiles_per_chest() -> u64 {
    400
}

const fn default_bonus_per_agent() -> u64 {
    2
}

const fn default_min_chests() -> u64 {
    10
}

const fn default_max_tiles_per_chest() -> u64 {
    40
}

const fn default_attempts_per_chest() -> u64 {
    50
}

/// Target number of chests for a world of `bounds` holding `agent_count`
/// agents.
pub fn desired_chest_count(
    bounds: &Bounds,
    agent_count: usize,
    density: &ChestDensity,
) -> u64 {
    let tiles = bounds.tile_count();
    let base = tiles.checked_div(density.tiles_per_chest).unwrap_or(0);
    let agents = u64::try_from(agent_count).unwrap_or(u64::MAX);
    let bonus = agents.saturating_mul(density.bonus_per_agent);
    let ceiling = tiles
        .checked_div(density.max_tiles_per_chest)
        .unwrap_or(tiles);
    density
        .min_chests
        .max(ceiling.min(base.saturating_add(bonus)))
}

/// Top the world up with chests until the target count is reached or the
/// draw budget runs out. Returns the number of chests spawned.
///
/// # Errors
///
/// Returns [`WorldError::InvalidBounds`] if the world's bounds are empty.
pub fn spawn_chests(
    state: &mut WorldState,
    density: &ChestDensity,
    rng: &mut impl Rng,
) -> Result<usize, WorldError> {
    let bounds = state.bounds;
    if !bounds.is_valid() {
        return Err(WorldError::InvalidBounds(bounds));
    }

    let target = desired_chest_count(&bounds, state.agents.len(), density);
    let existing = u64::try_from(state.chests.len()).unwrap_or(u64::MAX);
    let mut to_spawn = target.saturating_sub(existing);
    if to_spawn == 0 {
        return Ok(0);
    }

    let occupied = state.occupied_tiles();
    let max_attempts = to_spawn.saturating_mul(density.attempts_per_chest);
    let mut attempts: u64 = 0;
    let mut spawned: usize = 0;

    while to_spawn > 0 && attempts < max_attempts {
        attempts = attempts.saturating_add(1);

        let q = rng.random_range(bounds.min_q..=bounds.max_q);
        let r = rng.random_range(bounds.min_r..=bounds.max_r);
        let position = Position::new(q, r);

        if occupied.contains(&position) || state.chests.contains_key(&position.key()) {
            continue;
        }

        state.insert_chest(Chest::new(position, state.tick));
        to_spawn = to_spawn.saturating_sub(1);
        spawned = spawned.saturating_add(1);
    }

    debug!(
        tick = state.tick,
        target,
        spawned,
        attempts,
        chests = state.chests.len(),
        "Chest spawn pass"
    );

    Ok(spawned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexclash_types::{Agent, AgentId, Mode};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn default_world_target() {
        // 101 x 101 = 10201 tiles: base 25, ceiling 255.
        let bounds = Bounds::default();
        let density = ChestDensity::default();
        assert_eq!(desired_chest_count(&bounds, 0, &density), 25);
        assert_eq!(desired_chest_count(&bounds, 5, &density), 35);
        assert_eq!(desired_chest_count(&bounds, 1000, &density), 255);
    }

    #[test]
    fn floor_wins_in_small_worlds() {
        let bounds = Bounds::new(-1, 1, -1, 1);
        let density = ChestDensity::default();
        assert_eq!(desired_chest_count(&bounds, 3, &density), 10);
    }

    #[test]
    fn spawn_reaches_target_on_free_tiles() {
        let mut world = WorldState::new(Bounds::new(-20, 20, -20, 20));
        world.insert_agent(Agent::new(
            AgentId::from("a"),
            Position::new(0, 0),
            Mode::Scavenge,
        ));
        let density = ChestDensity::default();
        let mut rng = StdRng::seed_from_u64(11);

        let spawned = spawn_chests(&mut world, &density, &mut rng).unwrap();
        let target = desired_chest_count(&world.bounds, 1, &density);
        assert_eq!(u64::try_from(spawned).unwrap(), target);
        assert_eq!(u64::try_from(world.chests.len()).unwrap(), target);

        for (key, chest) in &world.chests {
            assert_eq!(*key, chest.position.key());
            assert!(world.bounds.contains(chest.position));
            assert_ne!(chest.position, Position::new(0, 0));
        }

        // Already at target: nothing more to do.
        assert_eq!(spawn_chests(&mut world, &density, &mut rng).unwrap(), 0);
    }

    #[test]
    fn crowded_world_gives_up_without_duplicates() {
        // 4 tiles, 3 of them occupied by agents: at most one chest fits.
        let mut world = WorldState::new(Bounds::new(0, 1, 0, 1));
        for (i, (q, r)) in [(0, 0), (0, 1), (1, 0)].into_iter().enumerate() {
            world.insert_agent(Agent::new(
                AgentId::from(format!("a{i}").as_str()),
                Position::new(q, r),
                Mode::Flee,
            ));
        }
        let mut rng = StdRng::seed_from_u64(3);
        let spawned = spawn_chests(&mut world, &ChestDensity::default(), &mut rng).unwrap();
        assert!(spawned <= 1);
        assert!(world.chests.len() <= 1);
        if let Some(chest) = world.chests.values().next() {
            assert_eq!(chest.position, Position::new(1, 1));
        }
    }

    #[test]
    fn same_seed_same_chests() {
        let density = ChestDensity::default();
        let mut a = WorldState::new(Bounds::default());
        let mut b = WorldState::new(Bounds::default());
        spawn_chests(&mut a, &density, &mut StdRng::seed_from_u64(99)).unwrap();
        spawn_chests(&mut b, &density, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a.chests, b.chests);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let mut world = WorldState::new(Bounds::new(1, 0, 0, 0));
        let result = spawn_chests(&mut world, &ChestDensity::default(), &mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(WorldError::InvalidBounds(_))));
    }

    #[test]
    fn density_parses_with_partial_overrides() {
        let density: ChestDensity = serde_json::from_str(r#"{"min_chests": 2}"#).unwrap();
        assert_eq!(density.min_chests, 2);
        assert_eq!(density.tiles_per_chest, 400);
    }
}
