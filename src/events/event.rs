//! # Runtime events emitted by controllers and deadline queues.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Worker events**: controller-supervised worker lifecycle (spawned, exited, faulted)
//! - **Queue events**: deadline queue flow control and lifecycle (suspend/resume, clear, close)
//! - **Subscriber events**: delivery problems inside the subscriber fan-out
//!
//! The [`Event`] struct carries metadata such as the timestamp, the emitting source,
//! a reason and an item count.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use deadq::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::QueueCleared)
//!     .with_source("deadline-queue")
//!     .with_count(12);
//!
//! assert_eq!(ev.kind, EventKind::QueueCleared);
//! assert_eq!(ev.source.as_deref(), Some("deadline-queue"));
//! assert_eq!(ev.count, Some(12));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Worker events ===
    /// A worker was spawned by a controller.
    ///
    /// Sets:
    /// - `source`: controller name
    WorkerSpawned,

    /// A worker returned (normally, on cancellation, or after its fault handler ran).
    ///
    /// Sets:
    /// - `source`: controller name
    WorkerExited,

    /// A worker panicked.
    ///
    /// Sets:
    /// - `source`: controller name
    /// - `reason`: panic message
    WorkerFaulted,

    /// A controller family was cancelled by `shutdown` or `wait_exit`.
    ///
    /// Sets:
    /// - `source`: controller name
    ControllerCancelled,

    // === Queue events ===
    /// Bounded queue reached its limit; the intake process stopped reading input.
    ///
    /// Sets:
    /// - `source`: queue name
    /// - `count`: pending items
    IntakeSuspended,

    /// The intake process resumed reading input after a pop freed capacity.
    ///
    /// Sets:
    /// - `source`: queue name
    /// - `count`: pending items
    IntakeResumed,

    /// A pushed item became the new earliest deadline; the release wait was cut short.
    ///
    /// Sets:
    /// - `source`: queue name
    Rescheduled,

    /// Pending items were discarded by `clear`.
    ///
    /// Sets:
    /// - `source`: queue name
    /// - `count`: items removed
    QueueCleared,

    /// The queue was closed and fully flushed.
    ///
    /// Sets:
    /// - `source`: queue name
    /// - `count`: cumulative popped items
    QueueClosed,

    /// The queue was shut down; buffered items were abandoned.
    ///
    /// Sets:
    /// - `source`: queue name
    /// - `count`: abandoned items
    QueueShutdown,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the emitting controller, queue or subscriber.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (panic messages, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Item count, if applicable.
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches the emitting source name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an item count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n as u64);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    /// Returns true for `SubscriberOverflow` events.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::WorkerSpawned);
        let b = Event::new(EventKind::WorkerExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_overflow_helper() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.source.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}
