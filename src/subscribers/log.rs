//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [worker-spawned] source="deadq-intake"
//! [intake-suspended] source="deadq" pending=10
//! [intake-resumed] source="deadq" pending=9
//! [rescheduled] source="deadq"
//! [queue-cleared] source="deadq" removed=4
//! [queue-closed] source="deadq" popped=96
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::WorkerSpawned => {
                println!("[worker-spawned] source={:?}", e.source);
            }
            EventKind::WorkerExited => {
                println!("[worker-exited] source={:?}", e.source);
            }
            EventKind::WorkerFaulted => {
                println!(
                    "[worker-faulted] source={:?} panic={:?}",
                    e.source, e.reason
                );
            }
            EventKind::ControllerCancelled => {
                println!("[controller-cancelled] source={:?}", e.source);
            }
            EventKind::IntakeSuspended => {
                println!(
                    "[intake-suspended] source={:?} pending={:?}",
                    e.source, e.count
                );
            }
            EventKind::IntakeResumed => {
                println!(
                    "[intake-resumed] source={:?} pending={:?}",
                    e.source, e.count
                );
            }
            EventKind::Rescheduled => {
                println!("[rescheduled] source={:?}", e.source);
            }
            EventKind::QueueCleared => {
                println!("[queue-cleared] source={:?} removed={:?}", e.source, e.count);
            }
            EventKind::QueueClosed => {
                println!("[queue-closed] source={:?} popped={:?}", e.source, e.count);
            }
            EventKind::QueueShutdown => {
                println!(
                    "[queue-shutdown] source={:?} abandoned={:?}",
                    e.source, e.count
                );
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.source, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    e.source.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
