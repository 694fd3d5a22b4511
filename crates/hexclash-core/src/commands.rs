//! Control commands queued by connections and applied by the tick loop.
//!
//! Connection tasks never touch the [`WorldState`]. They push a [`Command`]
//! onto the shared [`CommandQueue`]; the tick loop drains the queue once per
//! tick and applies the batch before planning, so planning always sees a
//! consistent world.
//!
//! Within one batch:
//!
//! - joins are applied first, so a client that joins and sets its mode in
//!   the same tick gets the mode it asked for;
//! - mode changes are coalesced per agent and the last one received wins.

use std::collections::BTreeMap;

use hexclash_types::{Agent, AgentId, Mode, WorldState};
use hexclash_world::placement::random_free_tile;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::AgentsConfig;

/// A control request from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Attach an identity to the world, creating its agent if needed.
    Join {
        /// The session's identity.
        agent_id: AgentId,
    },
    /// Change an agent's behavior policy.
    SetMode {
        /// The agent to update.
        agent_id: AgentId,
        /// The new policy.
        mode: Mode,
    },
}

/// Commands waiting for the next tick, merged per agent.
#[derive(Debug, Default)]
struct Pending {
    joins: Vec<AgentId>,
    modes: BTreeMap<AgentId, Mode>,
}

/// Thread-safe queue of pending commands.
///
/// Entries are merged as they arrive: an agent has at most one pending
/// join and one pending mode change, and a later mode change replaces an
/// earlier one. The queue therefore stays bounded by the number of agents
/// no matter how fast a connection sends.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Mutex<Pending>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command for the next tick.
    pub async fn push(&self, command: Command) {
        let mut pending = self.pending.lock().await;
        match command {
            Command::Join { agent_id } => {
                if !pending.joins.contains(&agent_id) {
                    pending.joins.push(agent_id);
                }
            }
            Command::SetMode { agent_id, mode } => {
                pending.modes.insert(agent_id, mode);
            }
        }
    }

    /// Take every pending command: joins in arrival order, then mode
    /// changes in agent id order.
    pub async fn drain(&self) -> Vec<Command> {
        let Pending { joins, modes } = std::mem::take(&mut *self.pending.lock().await);
        joins
            .into_iter()
            .map(|agent_id| Command::Join { agent_id })
            .chain(
                modes
                    .into_iter()
                    .map(|(agent_id, mode)| Command::SetMode { agent_id, mode }),
            )
            .collect()
    }

    /// Number of commands waiting.
    pub async fn len(&self) -> usize {
        let pending = self.pending.lock().await;
        pending.joins.len().saturating_add(pending.modes.len())
    }

    /// Whether no commands are waiting.
    pub async fn is_empty(&self) -> bool {
        let pending = self.pending.lock().await;
        pending.joins.is_empty() && pending.modes.is_empty()
    }
}

/// Counts of commands applied in one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    /// New agents created.
    pub joined: usize,
    /// Joins for agents that already existed.
    pub reattached: usize,
    /// Mode changes applied.
    pub mode_changes: usize,
    /// Commands dropped (unknown agent, full world).
    pub dropped: usize,
}

/// Apply one drained batch to the world.
pub fn apply_commands(
    state: &mut WorldState,
    commands: Vec<Command>,
    defaults: &AgentsConfig,
    rng: &mut impl Rng,
) -> CommandStats {
    let mut stats = CommandStats::default();
    let mut joins: Vec<AgentId> = Vec::new();
    let mut modes: BTreeMap<AgentId, Mode> = BTreeMap::new();

    for command in commands {
        match command {
            Command::Join { agent_id } => joins.push(agent_id),
            Command::SetMode { agent_id, mode } => {
                modes.insert(agent_id, mode);
            }
        }
    }

    for agent_id in joins {
        apply_join(state, agent_id, defaults, rng, &mut stats);
    }

    for (agent_id, mode) in modes {
        let Some(agent) = state.agents.get_mut(&agent_id) else {
            warn!(tick = state.tick, agent_id = %agent_id, %mode, "Mode change for unknown agent dropped");
            stats.dropped = stats.dropped.saturating_add(1);
            continue;
        };
        if agent.mode != mode {
            info!(tick = state.tick, agent_id = %agent_id, from = %agent.mode, to = %mode, "Mode changed");
            agent.mode = mode;
        }
        stats.mode_changes = stats.mode_changes.saturating_add(1);
    }

    stats
}

fn apply_join(
    state: &mut WorldState,
    agent_id: AgentId,
    defaults: &AgentsConfig,
    rng: &mut impl Rng,
    stats: &mut CommandStats,
) {
    if state.agents.contains_key(&agent_id) {
        info!(tick = state.tick, agent_id = %agent_id, "Agent reattached");
        stats.reattached = stats.reattached.saturating_add(1);
        return;
    }

    let occupied = state.occupied_tiles();
    match random_free_tile(&state.bounds, &occupied, rng, defaults.spawn_attempts) {
        Ok(position) => {
            let mut agent = Agent::new(agent_id, position, defaults.default_mode);
            agent.level = defaults.level;
            agent.speed = defaults.speed;
            agent.hp = defaults.hp;
            info!(tick = state.tick, agent_id = %agent.id, %position, mode = %agent.mode, "Agent joined");
            state.insert_agent(agent);
            stats.joined = stats.joined.saturating_add(1);
        }
        Err(e) => {
            warn!(tick = state.tick, agent_id = %agent_id, error = %e, "Join dropped");
            stats.dropped = stats.dropped.saturating_add(1);
        }
    }
}
