//! Post-resolution world invariants.
//!
//! After every resolution pass:
//!
//! - no two agents share a tile,
//! - every agent is inside the bounds,
//! - no agent carries an intent.
//!
//! A violation means the resolver is wrong. The tick loop logs it; the test
//! suite treats it as a failure.

use std::collections::BTreeMap;

use hexclash_types::{AgentId, Position, WorldState};

use crate::error::InvariantViolation;

/// Check every invariant, reporting the first violation found.
///
/// Agents are visited in identity order, so the reported violation is
/// deterministic.
pub fn check_world(state: &WorldState) -> Result<(), InvariantViolation> {
    let mut seen: BTreeMap<Position, &AgentId> = BTreeMap::new();

    for agent in state.agents.values() {
        if !state.bounds.contains(agent.position) {
            return Err(InvariantViolation::OutOfBounds {
                agent_id: agent.id.clone(),
                position: agent.position,
                bounds: state.bounds,
            });
        }
        if agent.intent.is_some() {
            return Err(InvariantViolation::LingeringIntent {
                agent_id: agent.id.clone(),
            });
        }
        if let Some(first) = seen.insert(agent.position, &agent.id) {
            return Err(InvariantViolation::SharedTile {
                position: agent.position,
                first: first.clone(),
                second: agent.id.clone(),
            });
        }
    }

    Ok(())
}
