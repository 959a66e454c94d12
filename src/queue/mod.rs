//! Deadline queue: intake and release processes around a shared min-heap.
//!
//! - [`DeadlineQueue`] public handle: push, clear, close, shutdown, stats.
//! - [`DeadlineQueueBuilder`] name, outer token and subscribers.
//! - [`Deadline`] trait implemented by queued items.
//! - [`Stats`] cumulative counters.

mod deadline_queue;
mod intake;
mod item;
mod release;
mod shared;
mod stats;

pub use deadline_queue::{DeadlineQueue, DeadlineQueueBuilder};
pub use item::Deadline;
pub use stats::Stats;
