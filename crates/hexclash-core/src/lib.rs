//! Configuration, control commands, sessions, and the tick loop for the
//! Hexclash simulation.
//!
//! This crate owns the tick cycle that drives the world: Commands, Spawn,
//! Actions, Plan, Resolve, Check, and Advance.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `hexclash-config.yaml` into
//!   strongly-typed structs, with `HEXCLASH_*` environment overrides.
//! - [`commands`] -- [`Command`] queue between connections and the tick
//!   loop.
//! - [`sessions`] -- Identity handshake and live connection tracking.
//! - [`operator`] -- Pause, resume, speed, and stop controls shared with the
//!   REST API.
//! - [`tick`] -- One tick of the phase sequence ([`run_tick`]).
//! - [`runner`] -- The paced, bounded simulation loop ([`run_simulation`]).
//!
//! [`Command`]: commands::Command
//! [`run_tick`]: tick::run_tick
//! [`run_simulation`]: runner::run_simulation

pub mod commands;
pub mod config;
pub mod operator;
pub mod runner;
pub mod sessions;
pub mod tick;
