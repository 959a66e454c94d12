//! # Deadline queue configuration.
//!
//! Provides [`QueueConfig`], the construction parameters of a
//! [`DeadlineQueue`](crate::DeadlineQueue).
//!
//! ## Sentinel values
//! - `limit = 0` → unbounded queue (no backpressure, direct push fast path)
//! - `resolution` below 1ms is clamped to 1ms by the release process

use std::time::Duration;

/// Default heap pre-allocation for unbounded queues.
const UNBOUNDED_HEAP_CAPACITY: usize = 1024;

/// Smallest polling step the release process will use.
const MIN_RESOLUTION: Duration = Duration::from_millis(1);

/// Construction parameters for a deadline queue.
///
/// ## Field semantics
/// - `resolution`: ceiling on the polling step of the release process. Long waits are
///   halved repeatedly; once the remaining time drops near the deadline the process
///   waits in steps of `resolution`, then exactly up to the deadline.
/// - `limit`: capacity bound (`0` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Polling resolution of the release process.
    pub resolution: Duration,

    /// Maximum number of pending items.
    ///
    /// - `0` = unbounded; [`push`](crate::DeadlineQueue::push) writes straight into the heap
    /// - `n > 0` = producers wait while `n` items are pending
    pub limit: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl QueueConfig {
    /// Creates a config with the given resolution and limit and default bus capacity.
    pub fn new(resolution: Duration, limit: usize) -> Self {
        Self {
            resolution,
            limit,
            ..Self::default()
        }
    }

    /// Returns the capacity bound as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` pending items
    #[inline]
    pub fn capacity_limit(&self) -> Option<usize> {
        if self.limit == 0 {
            None
        } else {
            Some(self.limit)
        }
    }

    /// Returns the polling resolution clamped to a minimum of 1ms.
    #[inline]
    pub fn resolution_clamped(&self) -> Duration {
        self.resolution.max(MIN_RESOLUTION)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns how many slots the heap pre-allocates.
    #[inline]
    pub fn initial_heap_capacity(&self) -> usize {
        self.capacity_limit().unwrap_or(UNBOUNDED_HEAP_CAPACITY)
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `resolution = 100ms`
    /// - `limit = 0` (unbounded)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            resolution: Duration::from_millis(100),
            limit: 0,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_sentinel() {
        let cfg = QueueConfig::default();
        assert_eq!(cfg.capacity_limit(), None);
        assert_eq!(cfg.initial_heap_capacity(), UNBOUNDED_HEAP_CAPACITY);
    }

    #[test]
    fn test_bounded_limit() {
        let cfg = QueueConfig::new(Duration::from_millis(50), 10);
        assert_eq!(cfg.capacity_limit(), Some(10));
        assert_eq!(cfg.initial_heap_capacity(), 10);
    }

    #[test]
    fn test_clamps() {
        let cfg = QueueConfig {
            resolution: Duration::ZERO,
            limit: 0,
            bus_capacity: 0,
        };
        assert_eq!(cfg.resolution_clamped(), MIN_RESOLUTION);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
