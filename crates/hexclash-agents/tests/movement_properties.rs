//! Seeded property checks for planning plus resolution over many worlds.
//!
//! Each case builds a random world from a fixed seed, then runs the
//! plan/commit/resolve cycle for a number of ticks, checking invariants
//! after every pass.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::panic)]

use std::collections::BTreeSet;

use hexclash_agents::{check_world, commit_intents, plan_intents, resolve};
use hexclash_types::{Agent, AgentId, Bounds, Chest, Intent, Mode, Position, WorldState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_world(seed: u64) -> WorldState {
    let mut rng = StdRng::seed_from_u64(seed);
    let half = rng.random_range(1..=6);
    let bounds = Bounds::new(-half, half, -half, half);
    let mut state = WorldState::new(bounds);

    let tiles: Vec<Position> = bounds.tiles().collect();
    let agent_count = rng.random_range(0..=tiles.len().min(20));
    let mut used = BTreeSet::new();
    let mut n = 0;
    while n < agent_count {
        let Some(&position) = tiles.get(rng.random_range(0..tiles.len())) else {
            continue;
        };
        if !used.insert(position) {
            continue;
        }
        let mode = Mode::ALL
            .get(rng.random_range(0..Mode::ALL.len()))
            .copied()
            .unwrap_or_default();
        let mut agent = Agent::new(AgentId::from(format!("p{n:02}").as_str()), position, mode);
        agent.speed = rng.random_range(1..=3);
        agent.level = rng.random_range(1..=3);
        state.insert_agent(agent);
        n += 1;
    }

    for _ in 0..rng.random_range(0..=4) {
        if let Some(&position) = tiles.get(rng.random_range(0..tiles.len())) {
            state.insert_chest(Chest::new(position, 0));
        }
    }
    state.tick = rng.random_range(0..1_000);
    state
}

fn step(state: WorldState) -> WorldState {
    let mut state = state;
    let intents = plan_intents(&state);
    commit_intents(&mut state, &intents);
    let (mut next, _) = resolve(state);
    next.tick += 1;
    next
}

#[test]
fn no_collision_and_bounds_hold_over_many_ticks() {
    for seed in 0..300 {
        let mut state = random_world(seed);
        check_world(&state).unwrap();
        for _ in 0..25 {
            let count = state.agents.len();
            state = step(state);
            assert_eq!(state.agents.len(), count);
            if let Err(violation) = check_world(&state) {
                panic!("seed {seed}, tick {}: {violation}", state.tick);
            }
        }
    }
}

#[test]
fn every_intent_is_cleared_after_resolve() {
    for seed in 0..100 {
        let mut state = random_world(seed);
        let intents = plan_intents(&state);
        commit_intents(&mut state, &intents);
        let (next, _) = resolve(state);
        assert!(next.agents.values().all(|a| a.intent.is_none()), "seed {seed}");
    }
}

#[test]
fn resolution_is_deterministic() {
    for seed in 0..100 {
        let mut a = random_world(seed);
        let mut b = random_world(seed);
        for _ in 0..10 {
            a = step(a);
            b = step(b);
        }
        assert_eq!(a, b, "seed {seed}");
    }
}

#[test]
fn arbitrary_intents_never_break_invariants() {
    // Intents drawn at random, including far, stationary and out-of-bounds
    // destinations, all land on a legal world.
    for seed in 0..300u64 {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(10_000));
        let mut state = random_world(seed);
        for agent in state.agents.values_mut() {
            if rng.random_bool(0.8) {
                let to = Position::new(
                    agent.position.q + rng.random_range(-2..=2),
                    agent.position.r + rng.random_range(-2..=2),
                );
                agent.intent = Some(Intent::to(to));
            }
        }
        let (next, report) = resolve(state);
        check_world(&next).unwrap();
        assert_eq!(
            report.moved() + report.lost() + report.blocked() + report.discarded(),
            report.outcomes.len()
        );
    }
}

#[test]
fn faster_agent_wins_contested_tile() {
    let bounds = Bounds::new(-1, 1, -1, 1);
    let mut state = WorldState::new(bounds);
    let mut a = Agent::new(AgentId::from("A"), Position::new(0, 0), Mode::Aggressive);
    a.speed = 2;
    a.intent = Some(Intent::to(Position::new(0, -1)));
    let mut b = Agent::new(AgentId::from("B"), Position::new(1, -1), Mode::Flee);
    b.intent = Some(Intent::to(Position::new(0, -1)));
    state.insert_agent(a);
    state.insert_agent(b);

    let (next, _) = resolve(state);
    let a = next.agents.get(&AgentId::from("A")).unwrap();
    let b = next.agents.get(&AgentId::from("B")).unwrap();
    assert_eq!(a.position, Position::new(0, -1));
    assert_eq!(b.position, Position::new(1, -1));
    assert!(a.intent.is_none());
    assert!(b.intent.is_none());
}
