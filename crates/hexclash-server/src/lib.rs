//! HTTP and `WebSocket` boundary for the Hexclash simulation.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Player `WebSocket`** (`/ws`): `HELLO`/`WELCOME` identity handshake,
//!   `SET_MODE` control messages, and one `UPDATE` snapshot per tick via
//!   [`tokio::sync::broadcast`]
//! - **REST endpoints** for reading the latest world snapshot and agents
//! - **Operator REST endpoints** for runtime control (pause, resume,
//!   speed, status, stop)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The server never touches the live world. Connection tasks push
//! [`Command`]s onto the shared queue that the tick loop drains, and the
//! engine's tick callback calls [`AppState::publish`] to replace the REST
//! snapshot and broadcast the encoded frame.
//!
//! [`Command`]: hexclash_core::commands::Command

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use startup::{ServerHandle, StartupError, spawn_server};
pub use state::AppState;
