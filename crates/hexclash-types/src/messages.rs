//! Wire messages exchanged with clients over the WebSocket.
//!
//! Every frame is a JSON object tagged by `type`. Framing and transport are
//! the server crate's concern; these types only fix the shapes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Mode;
use crate::ids::AgentId;
use crate::structs::WorldState;

/// A control message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Identity handshake; must be the first frame on a connection.
    Hello {
        /// Previously issued identity, if the client has one stored.
        #[serde(rename = "playerId", default)]
        player_id: Option<String>,
    },
    /// Switch the sender's behavior policy from the next planning phase on.
    SetMode {
        /// Requested policy.
        mode: Mode,
    },
}

/// A message pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Handshake reply carrying the identity the client must persist.
    Welcome {
        /// The session's agent identity.
        id: AgentId,
    },
    /// Full world snapshot after a tick.
    Update {
        /// The authoritative world state.
        state: WorldState,
    },
}
