//! Error types for the node arena.

/// Errors surfaced by [`NodeArena`](crate::NodeArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// Every slot in the fixed-capacity pool is in use. Fatal for the
    /// in-progress search turn; the caller must stop issuing expansions.
    #[error("node arena exhausted ({capacity} slots in use)")]
    Full {
        /// The arena's fixed capacity.
        capacity: usize,
    },
}
