//! # Schedulable items and their heap priority.
//!
//! Anything implementing [`Deadline`] can be pushed into a
//! [`DeadlineQueue`](crate::DeadlineQueue). Inside the queue each item is wrapped in an
//! [`Entry`] whose priority is the deadline in signed nanoseconds relative to the
//! queue's epoch (its construction instant). Deadlines before the epoch map to
//! negative priorities; distances beyond `i64` saturate.

use std::time::Duration;

use tokio::time::Instant;

use crate::heap::Prioritized;

/// An item that becomes eligible for release at a monotonic instant.
///
/// # Example
/// ```
/// use deadq::Deadline;
/// use tokio::time::Instant;
///
/// struct Reminder {
///     at: Instant,
///     text: String,
/// }
///
/// impl Deadline for Reminder {
///     fn deadline(&self) -> Instant {
///         self.at
///     }
/// }
/// ```
pub trait Deadline {
    /// Instant at or after which the item may be released.
    fn deadline(&self) -> Instant;
}

impl Deadline for Instant {
    fn deadline(&self) -> Instant {
        *self
    }
}

/// Heap slot: the item plus its cached deadline and priority.
pub(crate) struct Entry<T> {
    pub(crate) item: T,
    pub(crate) deadline: Instant,
    priority: i64,
}

impl<T: Deadline> Entry<T> {
    pub(crate) fn new(item: T, epoch: Instant) -> Self {
        let deadline = item.deadline();
        Self {
            item,
            deadline,
            priority: priority_of(deadline, epoch),
        }
    }
}

impl<T> Prioritized for Entry<T> {
    #[inline]
    fn priority(&self) -> i64 {
        self.priority
    }
}

/// Signed nanoseconds from `epoch` to `deadline`.
pub(crate) fn priority_of(deadline: Instant, epoch: Instant) -> i64 {
    if deadline >= epoch {
        saturating_nanos(deadline - epoch)
    } else {
        -saturating_nanos(epoch - deadline)
    }
}

#[inline]
fn saturating_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}
