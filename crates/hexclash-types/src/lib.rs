//! Shared type definitions for the Hexclash simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the Hexclash workspace. Types defined here flow to `TypeScript` via
//! `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Agent identities and tile keys
//! - [`enums`] -- Behavior policy ([`Mode`])
//! - [`structs`] -- Positions, bounds, agents, chests and [`WorldState`]
//! - [`messages`] -- Client/server wire messages

pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Mode;
pub use ids::{AgentId, MAX_AGENT_ID_LEN, TileKey};
pub use messages::{ClientMessage, ServerMessage};
pub use structs::{Agent, Bounds, Chest, Intent, Position, WorldState};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings to `bindings/` relative to the crate
        // root when `export_all` is called.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::TileKey::export_all();
        let _ = crate::enums::Mode::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::Bounds::export_all();
        let _ = crate::structs::Intent::export_all();
        let _ = crate::structs::Agent::export_all();
        let _ = crate::structs::Chest::export_all();
        let _ = crate::structs::WorldState::export_all();
        let _ = crate::messages::ClientMessage::export_all();
        let _ = crate::messages::ServerMessage::export_all();
    }
}
