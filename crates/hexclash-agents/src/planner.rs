//! Intent planning: one proposed step per agent per tick.
//!
//! Planning is a pure read of the previous tick's [`WorldState`]. Each agent
//! looks only at its six neighbors and scores them against a single target
//! chosen by its [`Mode`]:
//!
//! | Mode | Target | Neighbor choice |
//! |------|--------|-----------------|
//! | `Aggressive` | nearest other agent | minimize distance to target |
//! | `Flee` | nearest other agent | maximize distance to target |
//! | `Scavenge` | nearest chest | minimize distance to target |
//!
//! Target ties are broken by the smaller [`AgentId`] or [`TileKey`];
//! neighbor ties keep the first candidate in [`DIRECTIONS`] order. No target,
//! or no in-bounds neighbor, means no intent.
//!
//! [`TileKey`]: hexclash_types::TileKey
//! [`DIRECTIONS`]: hexclash_world::DIRECTIONS

use std::collections::BTreeMap;

use hexclash_types::{Agent, AgentId, Intent, Mode, Position, WorldState};
use hexclash_world::hex;
use tracing::debug;

/// Proposed destinations keyed by agent. Agents without an intent are absent.
pub type PlannedIntents = BTreeMap<AgentId, Position>;

/// The agent nearest to `agent`, excluding itself.
///
/// Minimizes `(distance, id)`, so the result is independent of map
/// iteration order.
pub fn nearest_enemy<'a>(agent: &Agent, state: &'a WorldState) -> Option<&'a Agent> {
    state
        .agents
        .values()
        .filter(|other| other.id != agent.id)
        .min_by(|a, b| {
            hex::distance(agent.position, a.position)
                .cmp(&hex::distance(agent.position, b.position))
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// The chest nearest to `from`, minimizing `(distance, tile key)`.
pub fn nearest_chest(from: Position, state: &WorldState) -> Option<Position> {
    state
        .chests
        .iter()
        .min_by(|(ka, a), (kb, b)| {
            hex::distance(from, a.position)
                .cmp(&hex::distance(from, b.position))
                .then_with(|| ka.cmp(kb))
        })
        .map(|(_, chest)| chest.position)
}

/// Which way a policy scores distance to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    Approach,
    Avoid,
}

/// Pick the in-bounds neighbor of `origin` that best serves `goal` with
/// respect to `target`. The first of several equally good neighbors wins.
fn best_neighbor(
    state: &WorldState,
    origin: Position,
    target: Position,
    goal: Goal,
) -> Option<Position> {
    let mut best: Option<(Position, u64)> = None;

    for candidate in hex::neighbors(origin).filter(|n| state.bounds.contains(*n)) {
        let score = hex::distance(candidate, target);
        let better = best.is_none_or(|(_, current)| match goal {
            Goal::Approach => score < current,
            Goal::Avoid => score > current,
        });
        if better {
            best = Some((candidate, score));
        }
    }

    best.map(|(position, _)| position)
}

/// The destination `agent` proposes this tick, if any.
pub fn plan_agent(agent: &Agent, state: &WorldState) -> Option<Position> {
    let (target, goal) = match agent.mode {
        Mode::Aggressive => (nearest_enemy(agent, state)?.position, Goal::Approach),
        Mode::Flee => (nearest_enemy(agent, state)?.position, Goal::Avoid),
        Mode::Scavenge => (nearest_chest(agent.position, state)?, Goal::Approach),
    };

    best_neighbor(state, agent.position, target, goal).filter(|next| *next != agent.position)
}

/// Plan intents for every agent in the world.
///
/// Reads `state` only; the order agents are visited in has no effect on the
/// result.
pub fn plan_intents(state: &WorldState) -> PlannedIntents {
    let mut intents = PlannedIntents::new();

    for agent in state.agents.values() {
        let planned = plan_agent(agent, state);
        debug!(
            tick = state.tick,
            agent_id = %agent.id,
            mode = %agent.mode,
            from = %agent.position,
            to = ?planned,
            "Intent planned"
        );
        if let Some(to) = planned {
            intents.insert(agent.id.clone(), to);
        }
    }

    intents
}

/// Write planned intents onto the owning agents. Agents absent from
/// `intents` keep whatever intent they had (normally none).
pub fn commit_intents(state: &mut WorldState, intents: &PlannedIntents) {
    for (agent_id, to) in intents {
        if let Some(agent) = state.agents.get_mut(agent_id) {
            agent.intent = Some(Intent::to(*to));
        }
    }
}
