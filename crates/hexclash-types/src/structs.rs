//! Core entity structs for the Hexclash simulation.
//!
//! [`WorldState`] is the single root of authoritative truth. It is owned by
//! the tick orchestrator, threaded by value through each phase, and
//! serialized whole to every connected client after each tick.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Mode;
use crate::ids::{AgentId, TileKey};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A tile address in axial hex coordinates.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
}

impl Position {
    /// Create a position from axial coordinates.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The position shifted by `(dq, dr)`, or `None` if either coordinate
    /// would overflow. An overflowing tile does not exist.
    pub const fn offset(self, dq: i32, dr: i32) -> Option<Self> {
        match (self.q.checked_add(dq), self.r.checked_add(dr)) {
            (Some(q), Some(r)) => Some(Self { q, r }),
            _ => None,
        }
    }

    /// The `"q,r"` key of this tile.
    pub fn key(self) -> TileKey {
        TileKey::new(self.q, self.r)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.q, self.r)
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Closed axial ranges defining the parallelogram-shaped playable region.
///
/// Replaced wholesale if ever changed, never mutated piecemeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Bounds {
    /// Smallest legal `q`.
    #[serde(alias = "min_q")]
    pub min_q: i32,
    /// Largest legal `q`.
    #[serde(alias = "max_q")]
    pub max_q: i32,
    /// Smallest legal `r`.
    #[serde(alias = "min_r")]
    pub min_r: i32,
    /// Largest legal `r`.
    #[serde(alias = "max_r")]
    pub max_r: i32,
}

impl Bounds {
    /// Create bounds from the four closed-interval limits.
    pub const fn new(min_q: i32, max_q: i32, min_r: i32, max_r: i32) -> Self {
        Self {
            min_q,
            max_q,
            min_r,
            max_r,
        }
    }

    /// Whether `p` lies inside both closed intervals.
    pub const fn contains(&self, p: Position) -> bool {
        p.q >= self.min_q && p.q <= self.max_q && p.r >= self.min_r && p.r <= self.max_r
    }

    /// Whether both intervals are non-empty.
    pub const fn is_valid(&self) -> bool {
        self.min_q <= self.max_q && self.min_r <= self.max_r
    }

    /// Number of tiles in the region, `0` for inverted bounds.
    pub fn tile_count(&self) -> u64 {
        if !self.is_valid() {
            return 0;
        }
        let q_count = u64::from(self.max_q.abs_diff(self.min_q)).saturating_add(1);
        let r_count = u64::from(self.max_r.abs_diff(self.min_r)).saturating_add(1);
        q_count.saturating_mul(r_count)
    }

    /// Every tile in the region, `q`-major then `r`.
    pub fn tiles(&self) -> impl Iterator<Item = Position> + use<> {
        let Self {
            min_q,
            max_q,
            min_r,
            max_r,
        } = *self;
        (min_q..=max_q).flat_map(move |q| (min_r..=max_r).map(move |r| Position::new(q, r)))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(-50, 50, -50, 50)
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// A one-tick-lived proposed move.
///
/// Either an absolute destination or a relative step. A step whose target
/// overflows the coordinate range has no destination and counts as
/// malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum Intent {
    /// Move to an absolute tile.
    Destination {
        /// Target tile.
        to: Position,
    },
    /// Move by a relative offset.
    Step {
        /// Change in `q`.
        dq: i32,
        /// Change in `r`.
        dr: i32,
    },
}

impl Intent {
    /// Intent to move to `to`.
    pub const fn to(to: Position) -> Self {
        Self::Destination { to }
    }

    /// Resolve the destination tile for an agent standing at `origin`.
    pub const fn destination(self, origin: Position) -> Option<Position> {
        match self {
            Self::Destination { to } => Some(to),
            Self::Step { dq, dr } => origin.offset(dq, dr),
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A simulated player.
///
/// Exclusively owned by the simulation. Live network connections refer to
/// an agent by [`AgentId`] only; the record outlives any connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Stable identity.
    pub id: AgentId,
    /// Current tile.
    #[serde(flatten)]
    pub position: Position,
    /// Behavior policy used by the planner.
    pub mode: Mode,
    /// Second arbitration key after speed.
    pub level: u32,
    /// First arbitration key for contested tiles.
    pub speed: u32,
    /// Hit points. Not consumed by movement.
    pub hp: u32,
    /// Pending move for the current tick; always `None` between ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub intent: Option<Intent>,
}

impl Agent {
    /// Create an agent with the default starting stats
    /// (level 1, speed 1, 10 hp) and no intent.
    pub const fn new(id: AgentId, position: Position, mode: Mode) -> Self {
        Self {
            id,
            position,
            mode,
            level: 1,
            speed: 1,
            hp: 10,
            intent: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chest
// ---------------------------------------------------------------------------

/// A collectible resource fixed to one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Chest {
    /// Identity derived from the tile key, `"ch_q,r"`.
    pub id: String,
    /// Tile the chest sits on.
    #[serde(flatten)]
    pub position: Position,
    /// Tick during which the chest was spawned.
    pub spawned_at_tick: u64,
}

impl Chest {
    /// Create the chest for `position`, spawned at `tick`.
    pub fn new(position: Position, tick: u64) -> Self {
        Self {
            id: format!("ch_{}", position.key()),
            position,
            spawned_at_tick: tick,
        }
    }
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// The authoritative world: tick counter, bounds, agents and chests.
///
/// Agents serialize under the `players` key and chests are keyed by
/// [`TileKey`], matching what the browser client renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldState {
    /// Completed-tick counter, starting at 0.
    pub tick: u64,
    /// Playable region.
    pub bounds: Bounds,
    /// Agents keyed by identity.
    #[serde(rename = "players")]
    pub agents: BTreeMap<AgentId, Agent>,
    /// Chests keyed by tile.
    pub chests: BTreeMap<TileKey, Chest>,
}

impl WorldState {
    /// An empty world at tick 0.
    pub const fn new(bounds: Bounds) -> Self {
        Self {
            tick: 0,
            bounds,
            agents: BTreeMap::new(),
            chests: BTreeMap::new(),
        }
    }

    /// Tiles currently holding an agent.
    pub fn occupied_tiles(&self) -> BTreeSet<Position> {
        self.agents.values().map(|a| a.position).collect()
    }

    /// Insert an agent, replacing any previous record with the same id.
    pub fn insert_agent(&mut self, agent: Agent) {
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Insert a chest keyed by its tile.
    pub fn insert_chest(&mut self, chest: Chest) {
        self.chests.insert(chest.position.key(), chest);
    }
}
