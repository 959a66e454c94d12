//! # Release process: heap → output stream, no earlier than each deadline.
//!
//! ```text
//! loop {
//!   suspended:
//!     ├─ heap non-empty            ─► working
//!     ├─ resume_release            ─► re-check
//!     ├─ intake_done && heap empty ─► exit
//!     └─ cancelled                 ─► exit
//!   working:
//!     peek earliest deadline (marks reschedules as seen)
//!     ├─ due     ─► reserve output slot ─► pop ─► send ─► empty? suspended : re-peek
//!     └─ not due ─► sleep(poll_interval) | reschedule | cancelled
//! }
//! ```
//!
//! ## Rules
//! - The output slot is reserved **before** popping, so cancellation never loses a
//!   popped item and `popped` only counts handed-over items.
//! - If the consumer dropped the output receiver, due items are popped and discarded.
//! - The sleep never extends past the earliest deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::controller::Scope;
use crate::queue::item::Deadline;
use crate::queue::shared::Shared;

pub(crate) async fn run<T>(shared: Arc<Shared<T>>, scope: Scope, output: mpsc::Sender<T>)
where
    T: Deadline + Send + Sync + 'static,
{
    let mut notices = shared.subscribe_reschedule();

    loop {
        // Suspended phase.
        loop {
            if shared.len().await > 0 {
                break;
            }
            tokio::select! {
                biased;
                _ = scope.cancelled() => return,
                _ = shared.resume_release.notified() => {}
                _ = shared.intake_done.cancelled() => {
                    if shared.len().await == 0 {
                        return;
                    }
                }
            }
        }

        // Working phase.
        loop {
            let Some(deadline) = shared.peek(&mut notices).await else {
                break;
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                let permit = tokio::select! {
                    biased;
                    _ = scope.cancelled() => return,
                    permit = output.reserve() => permit,
                };
                let (item, len) = shared.pop().await;
                if let Ok(permit) = permit {
                    permit.send(item);
                }
                if len == 0 {
                    break;
                }
                continue;
            }

            let timer = tokio::time::sleep(poll_interval(remaining, shared.resolution));
            tokio::pin!(timer);
            tokio::select! {
                biased;
                _ = scope.cancelled() => return,
                _ = notices.changed() => {}
                _ = &mut timer => {}
            }
        }
    }
}

/// Next wait before re-peeking.
///
/// Far from the deadline the wait halves the remaining time; near it the wait is the
/// resolution; within one resolution of it the wait is exactly the remaining time.
pub(crate) fn poll_interval(remaining: Duration, resolution: Duration) -> Duration {
    let half = remaining / 2;
    if half > resolution {
        half
    } else if remaining > resolution {
        resolution
    } else {
        remaining
    }
}
