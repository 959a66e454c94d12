//! # Cumulative queue counters.

use std::fmt;

/// Snapshot of a queue's lifetime counters.
///
/// Counters never reset: `clear()` only increases `cleared`. At any quiescent
/// point `pushed == popped + cleared + pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Items accepted into the heap.
    pub pushed: u64,
    /// Items released to the output stream.
    pub popped: u64,
    /// Items discarded by `clear()`.
    pub cleared: u64,
}

impl Stats {
    /// Items still buffered according to the counters.
    ///
    /// Saturates at zero for hand-built snapshots that break the invariant.
    pub fn pending(&self) -> u64 {
        self.pushed
            .saturating_sub(self.popped)
            .saturating_sub(self.cleared)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats: pushed={} popped={} cleared={}",
            self.pushed, self.popped, self.cleared
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_pending() {
        let stats = Stats {
            pushed: 10,
            popped: 6,
            cleared: 3,
        };
        assert_eq!(stats.to_string(), "Stats: pushed=10 popped=6 cleared=3");
        assert_eq!(stats.pending(), 1);
    }

    #[test]
    fn test_pending_saturates_on_inconsistent_snapshot() {
        let stats = Stats {
            pushed: 2,
            popped: 3,
            cleared: 1,
        };
        assert_eq!(stats.pending(), 0);
    }
}
