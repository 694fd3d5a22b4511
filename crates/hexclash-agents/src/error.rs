//! Error types for the hexclash-agents crate.
//!
//! Planning and resolution never fail: an unusable intent is discarded, not
//! reported. The only errors here describe a world that breaks an invariant
//! the resolver is supposed to guarantee, which is always a defect.

use hexclash_types::{AgentId, Bounds, Position};

/// A post-resolution world that breaks a movement invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Two distinct agents share a tile.
    #[error("agents {first} and {second} share tile {position}")]
    SharedTile {
        /// The shared tile.
        position: Position,
        /// The agent with the smaller identity.
        first: AgentId,
        /// The other agent.
        second: AgentId,
    },

    /// An agent stands outside the world bounds.
    #[error("agent {agent_id} at {position} is outside bounds q {}..={}, r {}..={}", .bounds.min_q, .bounds.max_q, .bounds.min_r, .bounds.max_r)]
    OutOfBounds {
        /// The offending agent.
        agent_id: AgentId,
        /// Its position.
        position: Position,
        /// The world bounds.
        bounds: Bounds,
    },

    /// An agent still carries an intent after resolution.
    #[error("agent {agent_id} still carries an intent after resolution")]
    LingeringIntent {
        /// The offending agent.
        agent_id: AgentId,
    },
}
