//! # deadq
//!
//! **deadq** is a deadline-ordered delivery queue for tokio.
//!
//! Producers push items carrying a monotonic deadline; a consumer reads them from an
//! output stream no earlier than each deadline, earliest first. The queue is built
//! from three layers that are usable on their own:
//!
//! - a [`PriorityQueue`] (array-backed binary heap with ascending or descending order);
//! - a [`Controller`] that spawns, cancels and awaits families of workers;
//! - the [`DeadlineQueue`], whose intake and release processes run under controllers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producers                                                         consumer
//!  ┌──────────┐                                                     ┌──────────┐
//!  │ push()   │                                                     │ recv()   │
//!  │ input()  │                                                     └────▲─────┘
//!  └────┬─────┘                                                          │
//!       ▼                                                                │
//! ┌───────────────────────────────────────────────────────────────────────────────┐
//! │  DeadlineQueue                                                                │
//! │  ┌─────────────┐      ┌───────────────────────────┐      ┌──────────────┐     │
//! │  │ intake      │ ───► │ heap (RwLock)             │ ───► │ release      │ ────┘
//! │  │ (Controller)│      │ PriorityQueue<Entry<T>>   │      │ (Controller) │
//! │  └─────▲───────┘      │ pushed · popped · cleared │      └──────▲───────┘
//! │        │              └─────────────┬─────────────┘             │
//! │        └──── resume_intake ◄────────┴───────► resume_release ───┘
//! │                                      └──────► reschedule ───────┘
//! └───────┬───────────────────────────────────────────────────────────────────────┘
//!         │ publish(Event)
//!         ▼
//! ┌──────────────────────────────┐        ┌────────────────────────┐
//! │ Bus (broadcast channel)      │ ─────► │ SubscriberSet          │ ──► sub.on_event()
//! │ (QueueConfig::bus_capacity)  │        │ (per-subscriber queues)│
//! └──────────────────────────────┘        └────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! DeadlineQueue::new(cfg) ──► spawn intake + release
//!
//! push ──► heap ──► release waits until the earliest deadline
//!                     ├─ earlier push ─► reschedule, wait again
//!                     └─ due          ─► send to output
//!
//! clear()    ─► stop both ─► discard pending ─► restart both
//! close()    ─► flush every pending item ─► close output
//! shutdown() ─► cancel both ─► abandon pending ─► close output
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                       |
//! |-------------------|-----------------------------------------------------------------|------------------------------------------|
//! | **Queue**         | Deadline-ordered delivery with optional backpressure.           | [`DeadlineQueue`], [`Deadline`], [`Stats`] |
//! | **Lifecycle**     | Spawn, cancel and await worker families.                        | [`Controller`], [`Scope`]                |
//! | **Heap**          | Binary heap keyed by an `i64` priority.                         | [`PriorityQueue`], [`Prioritized`]       |
//! | **Subscriber API**| Hook into queue and worker events (logging, metrics).           | [`Subscribe`], [`Event`]                 |
//! | **Errors**        | Typed errors for rejected pushes and worker panics.             | [`PushError`], [`WorkerFault`]           |
//! | **Configuration** | Resolution, capacity limit and bus capacity.                    | [`QueueConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use deadq::{Deadline, DeadlineQueue, QueueConfig};
//! use tokio::time::Instant;
//!
//! #[derive(Debug)]
//! struct Job {
//!     at: Instant,
//!     id: u32,
//! }
//!
//! impl Deadline for Job {
//!     fn deadline(&self) -> Instant {
//!         self.at
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Bounded queue: at most 16 pending items.
//!     let cfg = QueueConfig::new(Duration::from_millis(10), 16);
//!     let (queue, mut out) = DeadlineQueue::new(cfg);
//!
//!     let now = Instant::now();
//!     queue.push(Job { at: now + Duration::from_millis(300), id: 2 }).await?;
//!     queue.push(Job { at: now + Duration::from_millis(100), id: 1 }).await?;
//!
//!     let first = out.recv().await.expect("queue open");
//!     assert_eq!(first.id, 1);
//!     assert!(Instant::now() >= first.at);
//!
//!     queue.close().await;
//!     let second = out.recv().await.expect("flushed by close");
//!     assert_eq!(second.id, 2);
//!     assert!(out.recv().await.is_none());
//!     Ok(())
//! }
//! ```
mod config;
mod controller;
mod error;
mod events;
mod heap;
mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use controller::{Controller, Scope};
pub use error::{PushError, WorkerFault};
pub use events::{Bus, Event, EventKind};
pub use heap::{Order, Prioritized, PriorityQueue};
pub use queue::{Deadline, DeadlineQueue, DeadlineQueueBuilder, Stats};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
