//! Movement resolution for contested destinations.
//!
//! Every agent carrying an intent claims one destination tile. The resolver
//! turns the claims into a conflict-free, simultaneous update:
//!
//! 1. **Validate**: intents with no destination, a destination outside the
//!    bounds, the agent's own tile, or a tile that is not adjacent are
//!    discarded.
//! 2. **Group**: claimants are bucketed by destination, visiting agents in
//!    [`AgentId`] order.
//! 3. **Rank**: each bucket is sorted by higher `speed`, then higher
//!    `level`, then higher [`tie_score`], then smaller id. The first entry
//!    wins; every other claimant loses.
//! 4. **Block**: a winner whose destination is held by an agent that is not
//!    itself moving away stays put. Blocking cascades until stable, so chains
//!    behind a stationary agent all stay. Swaps and rotations still move.
//! 5. **Apply**: winning moves are computed from the pre-tick positions and
//!    applied together.
//! 6. **Clear**: every intent is reset, won or lost.
//!
//! Nothing here depends on wall-clock time or host iteration order. The same
//! world at the same tick always resolves the same way.

use std::collections::{BTreeMap, BTreeSet};

use hexclash_types::{AgentId, Position, WorldState};
use hexclash_world::hex;
use tracing::debug;

// ---------------------------------------------------------------------------
// Tie-break hash
// ---------------------------------------------------------------------------

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a over `bytes`.
fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic tie-break score for `agent_id` claiming `destination`
/// during `tick`. Higher wins.
///
/// FNV-1a of the text `"{tick}|{agent_id}|{q},{r}"`. Derived only from the
/// tick, so a rerun reproduces it and the next tick reshuffles it.
pub fn tie_score(tick: u64, agent_id: &AgentId, destination: Position) -> u32 {
    let seed = format!("{tick}|{agent_id}|{}", destination.key());
    fnv1a(seed.as_bytes())
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an intent was thrown away before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The intent has no destination (an overflowing step).
    Malformed,
    /// The destination lies outside the world bounds.
    OutOfBounds,
    /// The destination is the agent's current tile.
    Stationary,
    /// The destination is more than one step away.
    NotAdjacent,
}

/// What happened to one agent's intent this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The agent won its destination and moved.
    Moved {
        /// Tile before the move.
        from: Position,
        /// Tile after the move.
        to: Position,
    },
    /// Another claimant ranked higher for the same tile.
    Lost {
        /// The contested tile.
        to: Position,
        /// The claimant that took it.
        winner: AgentId,
    },
    /// The agent won its tile but an agent that stayed put still holds it.
    Blocked {
        /// The occupied tile.
        to: Position,
    },
    /// The intent was invalid and ignored.
    Discarded {
        /// Why it was ignored.
        reason: DiscardReason,
    },
}

/// Summary of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementReport {
    /// Outcome per agent that carried an intent. Agents with no intent are
    /// absent.
    pub outcomes: BTreeMap<AgentId, MoveOutcome>,
    /// Destinations that had more than one valid claimant.
    pub contested: usize,
}

impl MovementReport {
    fn count(&self, pred: impl Fn(&MoveOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| pred(o)).count()
    }

    /// Number of agents that moved.
    pub fn moved(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Moved { .. }))
    }

    /// Number of claimants that lost a contested tile.
    pub fn lost(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Lost { .. }))
    }

    /// Number of winning moves blocked by a stationary occupant.
    pub fn blocked(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Blocked { .. }))
    }

    /// Number of intents discarded during validation.
    pub fn discarded(&self) -> usize {
        self.count(|o| matches!(o, MoveOutcome::Discarded { .. }))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A validated claim on a destination tile.
#[derive(Debug, Clone)]
struct Claim {
    agent_id: AgentId,
    speed: u32,
    level: u32,
    score: u32,
}

/// Check an intent's destination against the agent's tile and the bounds.
fn validate(
    state: &WorldState,
    from: Position,
    to: Option<Position>,
) -> Result<Position, DiscardReason> {
    let to = to.ok_or(DiscardReason::Malformed)?;
    if !state.bounds.contains(to) {
        return Err(DiscardReason::OutOfBounds);
    }
    if to == from {
        return Err(DiscardReason::Stationary);
    }
    if hex::distance(from, to) != 1 {
        return Err(DiscardReason::NotAdjacent);
    }
    Ok(to)
}

/// Sort claimants best-first: speed desc, level desc, score desc, id asc.
fn rank(claims: &mut [Claim]) {
    claims.sort_by(|a, b| {
        b.speed
            .cmp(&a.speed)
            .then(b.level.cmp(&a.level))
            .then(b.score.cmp(&a.score))
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });
}

/// Remove winners whose destination is held by an agent that stays put.
/// Removing a winner makes it stay put too, so repeat until stable.
fn block_stationary_targets(
    state: &WorldState,
    winners: &mut BTreeMap<Position, AgentId>,
    report: &mut MovementReport,
) {
    let occupants: BTreeMap<Position, &AgentId> =
        state.agents.values().map(|a| (a.position, &a.id)).collect();
    loop {
        let moving: BTreeSet<&AgentId> = winners.values().collect();
        let blocked: Vec<Position> = winners
            .keys()
            .filter(|to| {
                occupants
                    .get(to)
                    .is_some_and(|occupant| !moving.contains(occupant))
            })
            .copied()
            .collect();
        if blocked.is_empty() {
            return;
        }
        for to in blocked {
            if let Some(agent_id) = winners.remove(&to) {
                debug!(tick = state.tick, agent_id = %agent_id, destination = %to, "Move blocked");
                report.outcomes.insert(agent_id, MoveOutcome::Blocked { to });
            }
        }
    }
}

/// Resolve every agent's intent into a new world state.
///
/// Consumes the pre-tick state and returns the post-tick state together
/// with a per-agent report. The tick counter is not advanced here.
pub fn resolve(mut state: WorldState) -> (WorldState, MovementReport) {
    let mut report = MovementReport::default();
    let tick = state.tick;

    // Steps 1-2: validate and group by destination, in id order.
    let mut claims: BTreeMap<Position, Vec<Claim>> = BTreeMap::new();
    for agent in state.agents.values() {
        let Some(intent) = agent.intent else {
            continue;
        };
        match validate(&state, agent.position, intent.destination(agent.position)) {
            Ok(to) => claims.entry(to).or_default().push(Claim {
                agent_id: agent.id.clone(),
                speed: agent.speed,
                level: agent.level,
                score: tie_score(tick, &agent.id, to),
            }),
            Err(reason) => {
                debug!(tick, agent_id = %agent.id, ?reason, "Intent discarded");
                report
                    .outcomes
                    .insert(agent.id.clone(), MoveOutcome::Discarded { reason });
            }
        }
    }

    // Step 3: rank each bucket and keep one winner per destination.
    let mut winners: BTreeMap<Position, AgentId> = BTreeMap::new();
    for (to, mut bucket) in claims {
        rank(&mut bucket);
        let Some((winner, losers)) = bucket.split_first() else {
            continue;
        };
        if !losers.is_empty() {
            report.contested = report.contested.saturating_add(1);
            debug!(
                tick,
                destination = %to,
                winner = %winner.agent_id,
                claimants = bucket.len(),
                "Contested destination"
            );
        }
        for loser in losers {
            report.outcomes.insert(
                loser.agent_id.clone(),
                MoveOutcome::Lost {
                    to,
                    winner: winner.agent_id.clone(),
                },
            );
        }
        winners.insert(to, winner.agent_id.clone());
    }

    // Step 4: drop winners whose destination stays occupied.
    block_stationary_targets(&state, &mut winners, &mut report);

    // Step 5: apply every surviving move from the pre-tick snapshot.
    for (to, agent_id) in winners {
        if let Some(agent) = state.agents.get_mut(&agent_id) {
            let from = agent.position;
            agent.position = to;
            report.outcomes.insert(agent_id, MoveOutcome::Moved { from, to });
        }
    }

    // Step 6: intents live for one tick only.
    for agent in state.agents.values_mut() {
        agent.intent = None;
    }

    (state, report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexclash_types::{Agent, Bounds, Intent, Mode};

    use super::*;

    fn agent_with(id: &str, at: (i32, i32), speed: u32, level: u32, to: Option<(i32, i32)>) -> Agent {
        let mut a = Agent::new(AgentId::from(id), Position::new(at.0, at.1), Mode::Aggressive);
        a.speed = speed;
        a.level = level;
        a.intent = to.map(|(q, r)| Intent::to(Position::new(q, r)));
        a
    }

    fn world(bounds: Bounds, tick: u64, agents: Vec<Agent>) -> WorldState {
        let mut state = WorldState::new(bounds);
        state.tick = tick;
        for a in agents {
            state.insert_agent(a);
        }
        state
    }

    fn pos(state: &WorldState, id: &str) -> Position {
        state.agents.get(&AgentId::from(id)).unwrap().position
    }

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn tie_score_hashes_tick_id_and_key() {
        let id = AgentId::from("p1");
        let to = Position::new(-2, 3);
        assert_eq!(tie_score(7, &id, to), fnv1a(b"7|p1|-2,3"));
    }

    #[test]
    fn faster_agent_wins_contested_tile() {
        let bounds = Bounds::new(-1, 1, -1, 1);
        let state = world(
            bounds,
            0,
            vec![
                agent_with("a", (0, 0), 2, 1, Some((0, -1))),
                agent_with("b", (1, -1), 1, 1, Some((0, -1))),
            ],
        );
        let (next, report) = resolve(state);
        assert_eq!(pos(&next, "a"), Position::new(0, -1));
        assert_eq!(pos(&next, "b"), Position::new(1, -1));
        assert!(next.agents.values().all(|a| a.intent.is_none()));
        assert_eq!(report.contested, 1);
        assert_eq!(report.moved(), 1);
        assert_eq!(
            report.outcomes.get(&AgentId::from("b")),
            Some(&MoveOutcome::Lost {
                to: Position::new(0, -1),
                winner: AgentId::from("a"),
            })
        );
    }

    #[test]
    fn level_breaks_speed_tie() {
        let state = world(
            Bounds::default(),
            0,
            vec![
                agent_with("a", (0, 0), 1, 1, Some((1, 0))),
                agent_with("b", (2, 0), 1, 3, Some((1, 0))),
            ],
        );
        let (next, _) = resolve(state);
        assert_eq!(pos(&next, "b"), Position::new(1, 0));
        assert_eq!(pos(&next, "a"), Position::new(0, 0));
    }

    #[test]
    fn hash_breaks_full_stat_tie_and_matches_ranking() {
        let to = Position::new(1, 0);
        let a = AgentId::from("a");
        let b = AgentId::from("b");
        for tick in 0..50 {
            let state = world(
                Bounds::default(),
                tick,
                vec![
                    agent_with("a", (0, 0), 1, 1, Some((1, 0))),
                    agent_with("b", (2, 0), 1, 1, Some((1, 0))),
                ],
            );
            let score_a = tie_score(tick, &a, to);
            let score_b = tie_score(tick, &b, to);
            let expected = if score_a >= score_b { "a" } else { "b" };
            let (next, _) = resolve(state);
            assert_eq!(pos(&next, expected), to, "tick {tick}");
        }
    }

    #[test]
    fn tie_break_varies_across_ticks() {
        let to = Position::new(1, 0);
        let a = AgentId::from("a");
        let b = AgentId::from("b");
        let winners: BTreeSet<bool> = (0..64)
            .map(|tick| tie_score(tick, &a, to) > tie_score(tick, &b, to))
            .collect();
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn out_of_bounds_intent_is_discarded() {
        let bounds = Bounds::new(-50, 50, -50, 50);
        let state = world(bounds, 0, vec![agent_with("a", (50, 0), 1, 1, Some((51, 0)))]);
        let (next, report) = resolve(state);
        assert_eq!(pos(&next, "a"), Position::new(50, 0));
        assert_eq!(
            report.outcomes.get(&AgentId::from("a")),
            Some(&MoveOutcome::Discarded {
                reason: DiscardReason::OutOfBounds
            })
        );
    }

    #[test]
    fn malformed_stationary_and_distant_intents_are_discarded() {
        let mut overflow = agent_with("a", (0, 0), 1, 1, None);
        overflow.position = Position::new(i32::MAX, 0);
        overflow.intent = Some(Intent::Step { dq: 1, dr: 0 });
        let bounds = Bounds::new(i32::MIN, i32::MAX, -5, 5);
        let state = world(
            bounds,
            0,
            vec![
                overflow,
                agent_with("b", (0, 0), 1, 1, Some((0, 0))),
                agent_with("c", (3, 3), 1, 1, Some((5, 3))),
            ],
        );
        let (next, report) = resolve(state);
        assert_eq!(report.discarded(), 3);
        assert_eq!(report.moved(), 0);
        assert_eq!(pos(&next, "c"), Position::new(3, 3));
        assert_eq!(
            report.outcomes.get(&AgentId::from("c")),
            Some(&MoveOutcome::Discarded {
                reason: DiscardReason::NotAdjacent
            })
        );
    }

    #[test]
    fn step_intents_resolve_like_destinations() {
        let mut a = agent_with("a", (0, 0), 1, 1, None);
        a.intent = Some(Intent::Step { dq: 0, dr: 1 });
        let (next, report) = resolve(world(Bounds::default(), 0, vec![a]));
        assert_eq!(pos(&next, "a"), Position::new(0, 1));
        assert_eq!(report.moved(), 1);
    }

    #[test]
    fn move_into_stationary_agent_is_blocked_and_cascades() {
        // c stays at (2,0); b wants (2,0); a wants b's tile (1,0).
        let state = world(
            Bounds::default(),
            0,
            vec![
                agent_with("a", (0, 0), 1, 1, Some((1, 0))),
                agent_with("b", (1, 0), 1, 1, Some((2, 0))),
                agent_with("c", (2, 0), 1, 1, None),
            ],
        );
        let (next, report) = resolve(state);
        assert_eq!(pos(&next, "a"), Position::new(0, 0));
        assert_eq!(pos(&next, "b"), Position::new(1, 0));
        assert_eq!(pos(&next, "c"), Position::new(2, 0));
        assert_eq!(report.blocked(), 2);
    }

    #[test]
    fn following_a_mover_succeeds() {
        let state = world(
            Bounds::default(),
            0,
            vec![
                agent_with("a", (0, 0), 1, 1, Some((1, 0))),
                agent_with("b", (1, 0), 1, 1, Some((2, 0))),
            ],
        );
        let (next, report) = resolve(state);
        assert_eq!(pos(&next, "a"), Position::new(1, 0));
        assert_eq!(pos(&next, "b"), Position::new(2, 0));
        assert_eq!(report.moved(), 2);
    }

    #[test]
    fn swaps_apply_from_pre_tick_snapshot() {
        let state = world(
            Bounds::default(),
            0,
            vec![
                agent_with("a", (0, 0), 1, 1, Some((1, 0))),
                agent_with("b", (1, 0), 1, 1, Some((0, 0))),
            ],
        );
        let (next, _) = resolve(state);
        assert_eq!(pos(&next, "a"), Position::new(1, 0));
        assert_eq!(pos(&next, "b"), Position::new(0, 0));
    }

    #[test]
    fn losing_claimant_stays_and_blocks_its_follower() {
        // b loses (1,-1) to the faster c and stays, so a cannot enter b's tile.
        let state = world(
            Bounds::default(),
            0,
            vec![
                agent_with("a", (0, 0), 1, 1, Some((1, 0))),
                agent_with("b", (1, 0), 1, 1, Some((1, -1))),
                agent_with("c", (2, -1), 5, 1, Some((1, -1))),
            ],
        );
        let (next, report) = resolve(state);
        assert_eq!(pos(&next, "c"), Position::new(1, -1));
        assert_eq!(pos(&next, "b"), Position::new(1, 0));
        assert_eq!(pos(&next, "a"), Position::new(0, 0));
        assert_eq!(report.lost(), 1);
        assert_eq!(report.blocked(), 1);
    }

    #[test]
    fn no_intents_is_a_no_op() {
        let state = world(
            Bounds::default(),
            3,
            vec![agent_with("a", (0, 0), 1, 1, None)],
        );
        let before = state.clone();
        let (next, report) = resolve(state);
        assert_eq!(next, before);
        assert!(report.outcomes.is_empty());
    }
}
