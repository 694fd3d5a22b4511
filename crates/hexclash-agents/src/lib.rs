//! Intent planning and movement resolution for the Hexclash simulation.
//!
//! This crate is the logic layer between `hexclash-types` (plain data) and
//! `hexclash-core` (the tick loop). Everything here is synchronous and pure:
//! functions take a [`WorldState`] and return a new one or a plan, with no
//! I/O and no randomness.
//!
//! # Modules
//!
//! - [`planner`] -- Per-mode target acquisition and neighbor scoring
//!   ([`plan_intents`])
//! - [`resolver`] -- Destination grouping, ranking, blocking and the
//!   simultaneous apply ([`resolve`])
//! - [`invariants`] -- Post-resolution checks ([`check_world`])
//! - [`error`] -- [`InvariantViolation`]
//!
//! [`WorldState`]: hexclash_types::WorldState

pub mod error;
pub mod invariants;
pub mod planner;
pub mod resolver;

// Re-export primary items at crate root for convenience.
pub use error::InvariantViolation;
pub use invariants::check_world;
pub use planner::{PlannedIntents, commit_intents, plan_agent, plan_intents};
pub use resolver::{DiscardReason, MoveOutcome, MovementReport, resolve, tie_score};
