//! Externally adjustable engine options consumed by this crate.

use std::sync::atomic::{AtomicI64, Ordering};

/// Option store shared between a front end and the search core.
///
/// Constructed once and handed to whoever needs it (the clock reads it on
/// every deadline calculation); the front end may update values mid-game
/// from another thread, hence the atomics.
#[derive(Debug)]
pub struct Options {
    /// Safety margin in milliseconds subtracted from every time budget.
    move_overhead: AtomicI64,
}

impl Options {
    /// Default `MoveOverhead` in milliseconds.
    pub const DEFAULT_MOVE_OVERHEAD_MS: i64 = 100;

    /// Create an option store with default values.
    pub fn new() -> Options {
        Options {
            move_overhead: AtomicI64::new(Self::DEFAULT_MOVE_OVERHEAD_MS),
        }
    }

    /// Return the current `MoveOverhead` in milliseconds.
    pub fn move_overhead(&self) -> i64 {
        self.move_overhead.load(Ordering::Relaxed)
    }

    /// Set `MoveOverhead`, clamping negative values to zero.
    pub fn set_move_overhead(&self, ms: i64) {
        self.move_overhead.store(ms.max(0), Ordering::Relaxed);
    }
}

impl Default for Options {
    fn default() -> Options {
        Options::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Options;

    #[test]
    fn default_overhead() {
        let options = Options::new();
        assert_eq!(options.move_overhead(), Options::DEFAULT_MOVE_OVERHEAD_MS);
    }

    #[test]
    fn set_and_read_back() {
        let options = Options::new();
        options.set_move_overhead(250);
        assert_eq!(options.move_overhead(), 250);
    }

    #[test]
    fn negative_overhead_clamps_to_zero() {
        let options = Options::new();
        options.set_move_overhead(-5);
        assert_eq!(options.move_overhead(), 0);
    }
}
