//! # DeadlineQueue: releases items on an output stream once their deadline is reached.
//!
//! The [`DeadlineQueue`] owns the heap of pending items and two supervised processes,
//! each running under its own [`Controller`] bound to the queue's cancellation token.
//!
//! ## Architecture
//! ```text
//! producers ──push()──────────────────────────────┐ (unbounded fast path)
//!     │                                           ▼
//!     └──input()/push()──► [mpsc input] ──► intake ──► heap (RwLock) ──► release ──► [mpsc output] ──► consumer
//!                                            ▲  │                          │  ▲
//!                              resume_intake │  └─ IntakeSuspended         │  │ reschedule / resume_release
//!                                            └─────────── pop ◄────────────┘  └──── push
//! ```
//!
//! ## Lifecycle
//! ```text
//! clear():    shutdown intake+release ─► heap.clear() ─► cleared += n ─► restart both
//! close():    close input ─► intake.wait_exit() ─► intake_done ─► release.wait_exit() ─► close output
//! shutdown(): cancel ─► intake.shutdown() ─► release.shutdown() ─► close output
//! ```
//!
//! ## Rules
//! - Unbounded: output is non-decreasing by deadline.
//! - Bounded (capacity `L`): ordering holds within any `L` consecutively pushed items.
//! - `close()` never discards buffered items; `shutdown()` never waits for a consumer.
//! - Dropping the queue cancels both processes and closes the output stream.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use deadq::{DeadlineQueue, QueueConfig};
//! use tokio::time::Instant;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() {
//!     let (queue, mut out) = DeadlineQueue::new(QueueConfig::default());
//!     let now = Instant::now();
//!     queue.push(now + Duration::from_secs(3)).await.unwrap();
//!     queue.push(now + Duration::from_secs(1)).await.unwrap();
//!
//!     assert_eq!(out.recv().await, Some(now + Duration::from_secs(1)));
//!     assert_eq!(out.recv().await, Some(now + Duration::from_secs(3)));
//!     queue.close().await;
//!     assert_eq!(out.recv().await, None);
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::controller::Controller;
use crate::error::PushError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::item::Deadline;
use crate::queue::shared::Shared;
use crate::queue::stats::Stats;
use crate::queue::{intake, release};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Capacity of the input and output channels.
const STREAM_CAPACITY: usize = 1;

/// Worker controllers and the queue's copy of the output sender.
struct Lifecycle<T> {
    intake: Controller,
    release: Controller,
    /// `None` once `close` or `shutdown` has run.
    output: Option<mpsc::Sender<T>>,
}

/// Deadline-ordered delivery queue.
pub struct DeadlineQueue<T> {
    shared: Arc<Shared<T>>,
    input: mpsc::Sender<T>,
    /// Cancels both processes; child of the outer token.
    token: CancellationToken,
    bus: Bus,
    lifecycle: Mutex<Lifecycle<T>>,
    subscribers: Option<Arc<SubscriberSet>>,
}

impl<T> DeadlineQueue<T>
where
    T: Deadline + Send + Sync + 'static,
{
    /// Creates a queue with a fresh outer token and no subscribers.
    ///
    /// Returns the queue handle and the output stream. Must be called within a tokio runtime.
    pub fn new(cfg: QueueConfig) -> (Self, mpsc::Receiver<T>) {
        Self::builder(cfg).build()
    }

    /// Returns a builder for a queue with a name, an outer token or subscribers.
    pub fn builder(cfg: QueueConfig) -> DeadlineQueueBuilder<T> {
        DeadlineQueueBuilder::new(cfg)
    }

    /// Enqueues an item.
    ///
    /// Unbounded queues insert straight into the heap. Bounded queues send through the
    /// input stream and wait while the queue is full.
    pub async fn push(&self, item: T) -> Result<(), PushError<T>> {
        if self.shared.limit.is_none() {
            return self.shared.push_direct(item).await;
        }
        if self.shared.input_closed.is_cancelled() {
            return Err(PushError::Closed(item));
        }
        self.input
            .send(item)
            .await
            .map_err(|mpsc::error::SendError(item)| PushError::Closed(item))
    }

    /// Returns a sender for the input stream.
    ///
    /// Sends wait while a bounded queue is full and fail once the input is closed.
    pub fn input(&self) -> mpsc::Sender<T> {
        self.input.clone()
    }

    /// Returns the event bus of this queue.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the queue name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns true once `close` or `shutdown` has closed the input.
    pub fn is_closed(&self) -> bool {
        self.shared.input_closed.is_cancelled()
    }

    /// Number of pending items.
    pub async fn len(&self) -> usize {
        self.shared.len().await
    }

    /// Returns true if no items are pending.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Consistent snapshot of the lifetime counters.
    pub async fn stats(&self) -> Stats {
        self.shared.stats().await
    }

    /// Stops both processes, discards every pending item and restarts the processes.
    ///
    /// Returns the number of items removed; `cleared` grows by the same amount.
    /// Processes are not restarted after `close`/`shutdown` or once the outer token
    /// is cancelled.
    pub async fn clear(&self) -> usize {
        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.intake.shutdown().await;
        lifecycle.release.shutdown().await;

        let removed = self.shared.clear().await;

        if let Some(output) = lifecycle.output.clone() {
            // None when the token was cancelled meanwhile; the stopped processes stay.
            if let Some((intake, release)) = self.start(output) {
                lifecycle.intake = intake;
                lifecycle.release = release;
            }
        }
        drop(lifecycle);

        self.shared
            .publish(Event::new(EventKind::QueueCleared).with_count(removed));
        removed
    }

    /// Closes the input and waits until every buffered item was sent to the output,
    /// then closes the output stream.
    ///
    /// Blocks while no consumer reads the output. A concurrent
    /// [`shutdown`](Self::shutdown) interrupts the flush.
    pub async fn close(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(output) = lifecycle.output.take() else {
            return;
        };

        self.shared.close_input().await;
        lifecycle.intake.wait_exit().await;
        self.shared.intake_done.cancel();
        lifecycle.release.wait_exit().await;
        drop(output);

        let popped = self.shared.stats().await.popped;
        self.shared
            .publish(Event::new(EventKind::QueueClosed).with_count(popped as usize));
    }

    /// Closes the input, cancels both processes and closes the output stream.
    ///
    /// Buffered items are abandoned. Never waits for a consumer.
    pub async fn shutdown(&self) {
        self.token.cancel();
        self.shared.close_input().await;

        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.intake.shutdown().await;
        self.shared.input.lock().await.close();
        self.shared.intake_done.cancel();
        lifecycle.release.shutdown().await;
        let Some(output) = lifecycle.output.take() else {
            return;
        };
        drop(output);

        let abandoned = self.shared.len().await;
        self.shared
            .publish(Event::new(EventKind::QueueShutdown).with_count(abandoned));
    }

    fn start(&self, output: mpsc::Sender<T>) -> Option<(Controller, Controller)> {
        start_processes(&self.shared, &self.token, &self.bus, output)
    }
}

impl<T> Drop for DeadlineQueue<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<T> std::fmt::Debug for DeadlineQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineQueue")
            .field("name", &self.shared.name)
            .field("limit", &self.shared.limit)
            .field("resolution", &self.shared.resolution)
            .field("closed", &self.shared.input_closed.is_cancelled())
            .field("subscribers", &self.subscribers.is_some())
            .finish()
    }
}

fn idle_processes<T>(
    shared: &Shared<T>,
    token: &CancellationToken,
    bus: &Bus,
) -> (Controller, Controller) {
    let intake =
        Controller::with_parent(format!("{}-intake", shared.name), token).with_bus(bus.clone());
    let release = Controller::with_parent(format!("{}-release", shared.name), token)
        .with_bus(bus.clone());
    (intake, release)
}

/// Spawns both processes. Returns `None` once `token` is cancelled.
fn start_processes<T>(
    shared: &Arc<Shared<T>>,
    token: &CancellationToken,
    bus: &Bus,
    output: mpsc::Sender<T>,
) -> Option<(Controller, Controller)>
where
    T: Deadline + Send + Sync + 'static,
{
    let (intake, release) = idle_processes(shared, token, bus);

    let s = Arc::clone(shared);
    if !release.try_spawn(move |scope| release::run(s, scope, output)) {
        return None;
    }
    // A release spawned under a just-cancelled token exits on its own.
    let s = Arc::clone(shared);
    if !intake.try_spawn(move |scope| intake::run(s, scope)) {
        return None;
    }

    Some((intake, release))
}

/// Builder for a [`DeadlineQueue`].
pub struct DeadlineQueueBuilder<T> {
    cfg: QueueConfig,
    name: Arc<str>,
    token: Option<CancellationToken>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _items: PhantomData<fn() -> T>,
}

impl<T> DeadlineQueueBuilder<T>
where
    T: Deadline + Send + Sync + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: QueueConfig) -> Self {
        Self {
            cfg,
            name: Arc::from("deadq"),
            token: None,
            subscribers: Vec::new(),
            _items: PhantomData,
        }
    }

    /// Sets the queue name used in events and controller names.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Binds the queue to an outer cancellation scope.
    ///
    /// Cancelling `token` stops both processes like [`DeadlineQueue::shutdown`] would,
    /// except that the output stream stays open until the queue is shut down or dropped.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the queue and starts its intake and release processes.
    ///
    /// If the outer token is already cancelled the processes are never started.
    ///
    /// # Panics
    /// Panics outside a tokio runtime.
    pub fn build(self) -> (DeadlineQueue<T>, mpsc::Receiver<T>) {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subscribers = if self.subscribers.is_empty() {
            None
        } else {
            let set = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
            set.listen();
            Some(set)
        };

        let (input_tx, input_rx) = mpsc::channel(STREAM_CAPACITY);
        let (output_tx, output_rx) = mpsc::channel(STREAM_CAPACITY);
        let token = self.token.unwrap_or_default().child_token();

        let shared = Arc::new(Shared::new(
            self.name,
            self.cfg.capacity_limit(),
            self.cfg.resolution_clamped(),
            self.cfg.initial_heap_capacity(),
            input_rx,
            bus.clone(),
        ));
        let (intake, release) = start_processes(&shared, &token, &bus, output_tx.clone())
            .unwrap_or_else(|| idle_processes(&shared, &token, &bus));

        let queue = DeadlineQueue {
            shared,
            input: input_tx,
            token,
            bus,
            lifecycle: Mutex::new(Lifecycle {
                intake,
                release,
                output: Some(output_tx),
            }),
            subscribers,
        };
        (queue, output_rx)
    }
}
