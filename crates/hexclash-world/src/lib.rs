//! Geometry and world population for the Hexclash simulation.
//!
//! This crate models the physical world: axial hex arithmetic over a bounded
//! parallelogram, the per-tick chest spawner, and spawn-tile selection for
//! joining agents. Nothing here knows about agents' policies or movement
//! arbitration.
//!
//! # Modules
//!
//! - [`hex`] -- Distance, neighbor enumeration, bounds checks and the
//!   flat-top pixel projection used by the browser client.
//! - [`chests`] -- Density-driven chest spawning with a bounded draw budget.
//! - [`placement`] -- Random free-tile selection for new agents.
//! - [`error`] -- Error types for placement operations.

pub mod chests;
pub mod error;
pub mod hex;
pub mod placement;

// Re-export primary items at crate root.
pub use chests::{ChestDensity, desired_chest_count, spawn_chests};
pub use error::WorldError;
pub use hex::{DIRECTIONS, HEX_SIZE, distance, hex_to_pixel, in_bounds, neighbors};
pub use placement::random_free_tile;
