//! # Intake process: input stream → heap.
//!
//! ```text
//! loop {
//!   ├─► working: recv(input) ─► push_from_input(item)
//!   │      ├─ unbounded or len < limit ─► continue
//!   │      └─ len == limit ─► IntakeSuspended
//!   └─► suspended: wait resume_intake, re-check len < limit
//! }
//! ```
//!
//! ## Rules
//! - `input_closed` closes the receiver; items already buffered are still forwarded,
//!   then the process returns.
//! - Cancellation is observed at every wait; the process exits without draining.

use std::sync::Arc;

use crate::controller::Scope;
use crate::events::{Event, EventKind};
use crate::queue::item::Deadline;
use crate::queue::shared::Shared;

pub(crate) async fn run<T>(shared: Arc<Shared<T>>, scope: Scope)
where
    T: Deadline + Send + Sync + 'static,
{
    let mut input = tokio::select! {
        biased;
        _ = scope.cancelled() => return,
        guard = shared.input.lock() => guard,
    };
    let mut open = true;

    loop {
        let received = tokio::select! {
            biased;
            _ = scope.cancelled() => return,
            _ = shared.input_closed.cancelled(), if open => {
                input.close();
                open = false;
                continue;
            }
            msg = input.recv() => msg,
        };
        let Some(item) = received else {
            return;
        };

        let len = shared.push_from_input(item).await;
        let Some(limit) = shared.limit else {
            continue;
        };
        if len < limit {
            continue;
        }

        shared.publish(Event::new(EventKind::IntakeSuspended).with_count(len));
        loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => return,
                _ = shared.resume_intake.notified() => {}
            }
            if shared.len().await < limit {
                break;
            }
        }
    }
}
