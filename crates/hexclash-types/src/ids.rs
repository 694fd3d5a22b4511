//! Identifier newtypes for agents and tiles.
//!
//! Agent identities are opaque strings: minted once by the server at first
//! contact and persisted client-side so a reconnecting client can present
//! them again. Tile keys are the `"q,r"` text form of a position and double
//! as the key of the chest map.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Maximum length of a client-presented agent identity.
pub const MAX_AGENT_ID_LEN: usize = 64;

/// Stable, opaque identity of an agent (player).
///
/// Ordering is plain lexicographic byte order of the inner string. Every
/// identity-based tie-break in the simulation relies on this ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentId(String);

impl AgentId {
    /// Mint a fresh identity (UUID v4, simple hex form).
    pub fn mint() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-presented identity if it is well formed.
    ///
    /// Well formed means 1 to [`MAX_AGENT_ID_LEN`] characters, each an ASCII
    /// alphanumeric, `-` or `_`. Anything else returns `None` and the caller
    /// mints a new identity instead.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_AGENT_ID_LEN {
            return None;
        }
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(trimmed.to_owned()))
    }

    /// Borrow the identity text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// Text key of a tile, formatted `"q,r"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TileKey(String);

impl TileKey {
    /// Build the key for axial coordinates `(q, r)`.
    pub fn new(q: i32, r: i32) -> Self {
        Self(format!("{q},{r}"))
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TileKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
