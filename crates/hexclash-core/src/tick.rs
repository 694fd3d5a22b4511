//! Tick cycle: the phase sequence that advances the world by one step.
//!
//! Each tick runs these phases strictly in order, threading the owned
//! [`WorldState`] from one to the next:
//!
//! 1. **Commands** -- apply the control commands drained since the last
//!    tick (joins, then mode changes).
//! 2. **Spawn** -- top up chests to the density target.
//! 3. **Actions** -- reserved for combat and other actions; no-op.
//! 4. **Plan** -- every agent proposes at most one step, written onto the
//!    agent as its intent.
//! 5. **Resolve** -- contested destinations are arbitrated and all winning
//!    moves applied at once; intents are cleared.
//! 6. **Check** -- post-resolution invariants are verified and any
//!    violation is logged as a defect.
//! 7. **Advance** -- the tick counter is incremented.
//!
//! Planning always reads the state left by the previous tick's resolution,
//! never a half-updated one. Broadcasting the result is the runner's job.

use hexclash_agents::{check_world, commit_intents, plan_intents, resolve};
use hexclash_types::WorldState;
use hexclash_world::{ChestDensity, WorldError, spawn_chests};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::commands::{Command, apply_commands};
use crate::config::{AgentsConfig, HexclashConfig};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The tick counter cannot be advanced any further.
    #[error("tick counter overflow at tick {tick}")]
    TickOverflow {
        /// The counter value that could not be incremented.
        tick: u64,
    },
}

/// Everything a tick needs besides the world itself.
#[derive(Debug, Clone)]
pub struct TickContext {
    /// Stats for agents created by joins.
    pub agents: AgentsConfig,
    /// Chest spawner density.
    pub chests: ChestDensity,
    /// Source of all spawn randomness.
    pub rng: StdRng,
}

impl TickContext {
    /// Build a context from config, seeding the RNG from `world.seed` or
    /// from the OS when no seed is set.
    pub fn from_config(config: &HexclashConfig) -> Self {
        let rng = config
            .world
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            agents: config.agents,
            chests: config.chests,
            rng,
        }
    }
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick counter after this tick completed.
    pub tick: u64,
    /// Agents in the world at end of tick.
    pub agents: usize,
    /// Chests in the world at end of tick.
    pub chests: usize,
    /// Chests spawned this tick.
    pub chests_spawned: usize,
    /// New agents created this tick.
    pub joins: usize,
    /// Joins for agents that already existed.
    pub reattached: usize,
    /// Mode changes applied this tick.
    pub mode_changes: usize,
    /// Commands dropped this tick.
    pub commands_dropped: usize,
    /// Agents that proposed a move.
    pub intents: usize,
    /// Agents that moved.
    pub moves: usize,
    /// Destinations with more than one claimant.
    pub contested: usize,
    /// Claimants that lost a contested destination.
    pub lost: usize,
    /// Winning moves blocked by a stationary occupant.
    pub blocked: usize,
    /// Intents discarded as invalid.
    pub discarded: usize,
}

/// Execute one full tick.
///
/// # Errors
///
/// Returns [`TickError::World`] if the world bounds are empty and
/// [`TickError::TickOverflow`] if the tick counter is exhausted. The input
/// state is consumed either way.
pub fn run_tick(
    mut state: WorldState,
    commands: Vec<Command>,
    ctx: &mut TickContext,
) -> Result<(WorldState, TickSummary), TickError> {
    let tick = state.tick;

    // --- Phase 1: Commands ---
    let command_stats = apply_commands(&mut state, commands, &ctx.agents, &mut ctx.rng);

    // --- Phase 2: Spawn ---
    let chests_spawned = spawn_chests(&mut state, &ctx.chests, &mut ctx.rng)?;

    // --- Phase 3: Actions ---
    debug!(tick, "Action phase (reserved)");

    // --- Phase 4: Plan ---
    let intents = plan_intents(&state);
    commit_intents(&mut state, &intents);

    // --- Phase 5: Resolve ---
    let (mut state, report) = resolve(state);

    // --- Phase 6: Check ---
    if let Err(violation) = check_world(&state) {
        error!(tick, %violation, "World invariant violated after resolution");
    }

    // --- Phase 7: Advance ---
    state.tick = tick
        .checked_add(1)
        .ok_or(TickError::TickOverflow { tick })?;

    let summary = TickSummary {
        tick: state.tick,
        agents: state.agents.len(),
        chests: state.chests.len(),
        chests_spawned,
        joins: command_stats.joined,
        reattached: command_stats.reattached,
        mode_changes: command_stats.mode_changes,
        commands_dropped: command_stats.dropped,
        intents: intents.len(),
        moves: report.moved(),
        contested: report.contested,
        lost: report.lost(),
        blocked: report.blocked(),
        discarded: report.discarded(),
    };

    info!(
        tick = summary.tick,
        agents = summary.agents,
        chests = summary.chests,
        moves = summary.moves,
        contested = summary.contested,
        "Tick completed"
    );

    Ok((state, summary))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexclash_types::{Agent, AgentId, Bounds, Mode, Position};

    use super::*;

    fn context(seed: u64) -> TickContext {
        let mut config = HexclashConfig::default();
        config.world.seed = Some(seed);
        TickContext::from_config(&config)
    }

    #[test]
    fn tick_advances_counter_and_spawns_chests() {
        let state = WorldState::new(Bounds::new(-10, 10, -10, 10));
        let mut ctx = context(1);
        let (state, summary) = run_tick(state, Vec::new(), &mut ctx).unwrap();
        assert_eq!(state.tick, 1);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.chests_spawned, 10);
        assert_eq!(summary.chests, 10);
        assert!(state.chests.values().all(|c| c.spawned_at_tick == 0));
    }

    #[test]
    fn join_and_mode_change_take_effect_in_the_same_tick() {
        let state = WorldState::new(Bounds::default());
        let mut ctx = context(2);
        let commands = vec![
            Command::Join {
                agent_id: AgentId::from("a"),
            },
            Command::SetMode {
                agent_id: AgentId::from("a"),
                mode: Mode::Scavenge,
            },
        ];
        let (state, summary) = run_tick(state, commands, &mut ctx).unwrap();
        assert_eq!(summary.joins, 1);
        assert_eq!(summary.mode_changes, 1);
        let agent = state.agents.get(&AgentId::from("a")).unwrap();
        assert_eq!(agent.mode, Mode::Scavenge);
        // Chests exist, so a scavenger always has a target and moves.
        assert_eq!(summary.intents, 1);
        assert_eq!(summary.moves, 1);
        assert!(agent.intent.is_none());
    }

    #[test]
    fn planning_sees_previous_tick_state() {
        let mut state = WorldState::new(Bounds::default());
        state.insert_agent(Agent::new(AgentId::from("a"), Position::new(0, 0), Mode::Aggressive));
        state.insert_agent(Agent::new(AgentId::from("b"), Position::new(4, 0), Mode::Aggressive));
        let mut ctx = context(3);
        let (state, summary) = run_tick(state, Vec::new(), &mut ctx).unwrap();
        assert_eq!(summary.moves, 2);
        assert_eq!(state.agents.get(&AgentId::from("a")).unwrap().position, Position::new(1, 0));
        assert_eq!(state.agents.get(&AgentId::from("b")).unwrap().position, Position::new(3, 0));
    }

    #[test]
    fn same_seed_same_history() {
        let run = || {
            let mut ctx = context(42);
            let mut state = WorldState::new(Bounds::new(-8, 8, -8, 8));
            let mut commands: Vec<Command> = (0..6)
                .map(|n| Command::Join {
                    agent_id: AgentId::from(format!("p{n}").as_str()),
                })
                .collect();
            commands.push(Command::SetMode {
                agent_id: AgentId::from("p1"),
                mode: Mode::Flee,
            });
            commands.push(Command::SetMode {
                agent_id: AgentId::from("p2"),
                mode: Mode::Scavenge,
            });
            for _ in 0..30 {
                let (next, _) = run_tick(state, std::mem::take(&mut commands), &mut ctx).unwrap();
                check_world(&next).unwrap();
                state = next;
            }
            state
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn exhausted_counter_is_an_error() {
        let mut state = WorldState::new(Bounds::new(0, 1, 0, 1));
        state.tick = u64::MAX;
        let mut ctx = context(4);
        let result = run_tick(state, Vec::new(), &mut ctx);
        assert!(matches!(result, Err(TickError::TickOverflow { tick: u64::MAX })));
    }

    #[test]
    fn empty_bounds_are_an_error() {
        let state = WorldState::new(Bounds::new(1, 0, 0, 0));
        let mut ctx = context(5);
        assert!(matches!(
            run_tick(state, Vec::new(), &mut ctx),
            Err(TickError::World { .. })
        ));
    }
}
