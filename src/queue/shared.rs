//! # State shared by the queue handle and its intake/release processes.
//!
//! Every heap mutation goes through this module so that the notice it may trigger
//! fires inside the same write-locked critical section:
//!
//! ```text
//! push: empty → non-empty            ─► resume_release.notify_one()
//! push: new deadline < current min   ─► reschedule generation += 1
//! pop:  len == limit → len < limit   ─► resume_intake.notify_one()
//! clear: len == limit                ─► resume_intake.notify_one()
//! ```
//!
//! `Notify::notify_one` stores a permit when nobody waits, so a notice fired between
//! a waiter's condition check and its wait is never lost. Waiters re-check their
//! condition after waking, so a stale permit only costs one extra check.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::PushError;
use crate::events::{Bus, Event, EventKind};
use crate::heap::{Order, PriorityQueue};
use crate::queue::item::{Deadline, Entry};
use crate::queue::stats::Stats;

/// Data guarded by the queue lock.
pub(crate) struct State<T> {
    heap: PriorityQueue<Entry<T>>,
    pushed: u64,
    popped: u64,
    cleared: u64,
    /// Set once by `close`/`shutdown`; rejects direct pushes afterwards.
    closed: bool,
}

pub(crate) struct Shared<T> {
    pub(crate) name: Arc<str>,
    pub(crate) limit: Option<usize>,
    pub(crate) resolution: Duration,
    /// Origin of heap priorities.
    epoch: Instant,
    state: RwLock<State<T>>,
    /// Input stream receiver; held by the running intake process.
    pub(crate) input: Mutex<mpsc::Receiver<T>>,
    pub(crate) resume_intake: Notify,
    pub(crate) resume_release: Notify,
    /// Reschedule notice: the generation is bumped on every fire.
    reschedule: watch::Sender<u64>,
    /// Fired when the queue input is closed (by `close` or `shutdown`).
    pub(crate) input_closed: CancellationToken,
    /// Close-intake notice: the intake process has drained the input and exited.
    pub(crate) intake_done: CancellationToken,
    bus: Bus,
}

impl<T: Deadline> Shared<T> {
    pub(crate) fn new(
        name: Arc<str>,
        limit: Option<usize>,
        resolution: Duration,
        heap_capacity: usize,
        input: mpsc::Receiver<T>,
        bus: Bus,
    ) -> Self {
        let (reschedule, _) = watch::channel(0);
        Self {
            name,
            limit,
            resolution,
            epoch: Instant::now(),
            state: RwLock::new(State {
                heap: PriorityQueue::with_capacity(Order::Ascending, heap_capacity),
                pushed: 0,
                popped: 0,
                cleared: 0,
                closed: false,
            }),
            input: Mutex::new(input),
            resume_intake: Notify::new(),
            resume_release: Notify::new(),
            reschedule,
            input_closed: CancellationToken::new(),
            intake_done: CancellationToken::new(),
            bus,
        }
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_source(Arc::clone(&self.name)));
    }

    /// Returns a receiver for reschedule notices.
    pub(crate) fn subscribe_reschedule(&self) -> watch::Receiver<u64> {
        self.reschedule.subscribe()
    }

    /// Direct push used by unbounded queues; rejected once the queue is closed.
    pub(crate) async fn push_direct(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(PushError::Closed(item));
        }
        self.insert(&mut state, item);
        Ok(())
    }

    /// Push performed by the intake process. Returns the pending length afterwards.
    pub(crate) async fn push_from_input(&self, item: T) -> usize {
        let mut state = self.state.write().await;
        self.insert(&mut state, item);
        state.heap.len()
    }

    fn insert(&self, state: &mut State<T>, item: T) {
        let entry = Entry::new(item, self.epoch);
        if state.heap.is_empty() {
            self.resume_release.notify_one();
        } else if entry.deadline < state.heap.peek().deadline {
            self.reschedule.send_modify(|generation| *generation = generation.wrapping_add(1));
            self.publish(Event::new(EventKind::Rescheduled));
        }
        state.heap.push(entry);
        state.pushed += 1;
    }

    /// Looks at the earliest deadline and marks every reschedule fired so far as seen.
    ///
    /// Both happen under the read lock, so a reschedule fired by a later push is
    /// always observed by `changed()` on `notices`.
    pub(crate) async fn peek(&self, notices: &mut watch::Receiver<u64>) -> Option<Instant> {
        let state = self.state.read().await;
        notices.borrow_and_update();
        if state.heap.is_empty() {
            None
        } else {
            Some(state.heap.peek().deadline)
        }
    }

    /// Removes the earliest item. Returns it with the pending length afterwards.
    ///
    /// # Panics
    /// Panics if the heap is empty; only the release process pops, after a peek.
    pub(crate) async fn pop(&self) -> (T, usize) {
        let mut state = self.state.write().await;
        let was_full = self.limit.is_some_and(|limit| state.heap.len() == limit);
        let entry = state.heap.pop();
        state.popped += 1;
        let len = state.heap.len();
        if was_full {
            self.resume_intake.notify_one();
            self.publish(Event::new(EventKind::IntakeResumed).with_count(len));
        }
        (entry.item, len)
    }

    /// Discards every pending item and returns how many were removed.
    pub(crate) async fn clear(&self) -> usize {
        let mut state = self.state.write().await;
        let removed = state.heap.clear();
        state.cleared += removed as u64;
        if self.limit.is_some_and(|limit| removed == limit) {
            self.resume_intake.notify_one();
        }
        removed
    }

    /// Rejects further direct pushes and tells the intake process to close the input.
    pub(crate) async fn close_input(&self) {
        self.state.write().await.closed = true;
        self.input_closed.cancel();
    }

    pub(crate) async fn len(&self) -> usize {
        self.state.read().await.heap.len()
    }

    pub(crate) async fn stats(&self) -> Stats {
        let state = self.state.read().await;
        Stats {
            pushed: state.pushed,
            popped: state.popped,
            cleared: state.cleared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(limit: Option<usize>) -> Shared<Instant> {
        let (_tx, rx) = mpsc::channel(1);
        Shared::new(
            "test".into(),
            limit,
            Duration::from_millis(10),
            4,
            rx,
            Bus::new(8),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_push_wakes_release() {
        let s = shared(None);
        s.push_direct(Instant::now() + Duration::from_secs(1))
            .await
            .expect("open");
        // permit stored: completes immediately
        s.resume_release.notified().await;
        assert_eq!(s.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_fires_reschedule() {
        let s = shared(None);
        let mut notices = s.subscribe_reschedule();
        let now = Instant::now();

        s.push_direct(now + Duration::from_secs(10)).await.expect("open");
        assert_eq!(s.peek(&mut notices).await, Some(now + Duration::from_secs(10)));

        s.push_direct(now + Duration::from_secs(20)).await.expect("open");
        assert!(!notices.has_changed().expect("sender alive"));

        s.push_direct(now + Duration::from_secs(4)).await.expect("open");
        assert!(notices.has_changed().expect("sender alive"));
        assert_eq!(s.peek(&mut notices).await, Some(now + Duration::from_secs(4)));
        assert!(!notices.has_changed().expect("sender alive"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_from_full_resumes_intake_once() {
        let s = shared(Some(2));
        let now = Instant::now();
        assert_eq!(s.push_from_input(now + Duration::from_secs(2)).await, 1);
        assert_eq!(s.push_from_input(now + Duration::from_secs(1)).await, 2);

        let (first, len) = s.pop().await;
        assert_eq!(first, now + Duration::from_secs(1));
        assert_eq!(len, 1);
        s.resume_intake.notified().await;

        let (_, len) = s.pop().await;
        assert_eq!(len, 0);
        let stats = s.stats().await;
        assert_eq!((stats.pushed, stats.popped, stats.cleared), (2, 2, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_counts_and_closed_rejects() {
        let s = shared(None);
        for secs in 1..=3 {
            s.push_direct(Instant::now() + Duration::from_secs(secs))
                .await
                .expect("open");
        }
        assert_eq!(s.clear().await, 3);
        assert_eq!(s.stats().await.cleared, 3);

        s.close_input().await;
        assert!(s.input_closed.is_cancelled());
        let rejected = s.push_direct(Instant::now()).await;
        assert!(matches!(rejected, Err(PushError::Closed(_))));
    }
}
