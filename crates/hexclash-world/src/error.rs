//! Error types for the `hexclash-world` crate.

use hexclash_types::Bounds;

/// Errors that can occur during world placement operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The bounds describe an empty region (`min > max` on some axis).
    #[error("invalid bounds: q {}..={}, r {}..={}", .0.min_q, .0.max_q, .0.min_r, .0.max_r)]
    InvalidBounds(Bounds),

    /// Every tile inside the bounds is already occupied.
    #[error("no free tile left among {tiles} tiles")]
    NoFreeTile {
        /// Number of tiles in the region.
        tiles: u64,
    },
}
