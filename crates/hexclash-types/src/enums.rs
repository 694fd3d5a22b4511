//! Enumeration types for the Hexclash simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Behavior policy an agent follows when planning its move each tick.
///
/// Serialized in the wire format as `AGGRESSIVE`, `FLEE` or `SCAVENGE`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Mode {
    /// Step toward the nearest other agent.
    #[default]
    Aggressive,
    /// Step away from the nearest other agent.
    Flee,
    /// Step toward the nearest chest.
    Scavenge,
}

impl Mode {
    /// All modes in declaration order.
    pub const ALL: [Self; 3] = [Self::Aggressive, Self::Flee, Self::Scavenge];

    /// Wire name of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aggressive => "AGGRESSIVE",
            Self::Flee => "FLEE",
            Self::Scavenge => "SCAVENGE",
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
