use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deadq::{
    Deadline, DeadlineQueue, Event, EventKind, PushError, QueueConfig, Stats, Subscribe,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const RES: Duration = Duration::from_millis(100);

fn unbounded() -> QueueConfig {
    QueueConfig::new(RES, 0)
}

fn bounded(limit: usize) -> QueueConfig {
    QueueConfig::new(Duration::from_millis(10), limit)
}

fn assert_balanced(stats: Stats, pending: usize) {
    assert_eq!(
        stats.pushed,
        stats.popped + stats.cleared + pending as u64,
        "{stats} pending={pending}"
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    at: Instant,
    id: usize,
}

impl Deadline for Job {
    fn deadline(&self) -> Instant {
        self.at
    }
}

#[tokio::test(start_paused = true)]
async fn test_earlier_push_reschedules_release() {
    let (queue, mut out) = DeadlineQueue::new(unbounded());
    let now = Instant::now();
    let secs = [10_u64, 4, 1];

    for s in secs {
        queue
            .push(now + Duration::from_secs(s))
            .await
            .expect("queue open");
        tokio::task::yield_now().await;
    }

    for expected in [1_u64, 4, 10] {
        let deadline = out.recv().await.expect("item released");
        let released_at = Instant::now();
        assert_eq!(deadline, now + Duration::from_secs(expected));
        assert!(released_at >= deadline);
        assert!(released_at - deadline <= RES, "released late: {:?}", released_at - deadline);
    }

    let stats = queue.stats().await;
    assert_eq!((stats.pushed, stats.popped, stats.cleared), (3, 3, 0));
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_bounded_backpressure_keeps_pending_under_limit() {
    let (queue, mut out) = DeadlineQueue::new(bounded(10));
    let queue = Arc::new(queue);
    let now = Instant::now();

    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            for i in 0..100_u64 {
                queue
                    .push(now + Duration::from_millis(i))
                    .await
                    .expect("queue open");
            }
        })
    };

    let mut received = Vec::with_capacity(100);
    while received.len() < 100 {
        assert!(queue.len().await <= 10);
        let item = out.recv().await.expect("item released");
        assert!(Instant::now() >= item);
        received.push(item);
    }
    producer.await.expect("producer finished");

    let stats = queue.stats().await;
    assert_eq!(stats.pushed, 100);
    assert_eq!(stats.popped, 100);
    assert!(received.windows(2).all(|w| w[0] <= w[1]));
    queue.close().await;
    assert!(out.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_output_is_sorted() {
    let (queue, mut out) = DeadlineQueue::new(unbounded());
    let now = Instant::now();

    for i in 0..50_usize {
        let at = now + Duration::from_millis(1 + ((i * 37) % 50) as u64 * 20);
        queue.push(Job { at, id: i }).await.expect("queue open");
    }

    let mut last = now;
    for _ in 0..50 {
        let job = out.recv().await.expect("item released");
        assert!(job.id < 50);
        assert!(job.at >= last);
        assert!(Instant::now() >= job.at);
        last = job.at;
    }
    assert!(queue.is_empty().await);
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_flushes_every_pending_item() {
    let (queue, mut out) = DeadlineQueue::new(unbounded());
    let now = Instant::now();
    for s in [5_u64, 3, 9, 1, 7] {
        queue
            .push(now + Duration::from_secs(s))
            .await
            .expect("queue open");
    }

    let consumer = tokio::spawn(async move {
        let mut items = Vec::new();
        while let Some(item) = out.recv().await {
            items.push(item);
        }
        items
    });

    queue.close().await;
    let items = consumer.await.expect("consumer finished");
    assert_eq!(items.len(), 5);
    assert!(items.windows(2).all(|w| w[0] <= w[1]));

    assert!(queue.is_closed());
    let stats = queue.stats().await;
    assert_eq!((stats.pushed, stats.popped), (5, 5));

    let rejected = queue.push(Instant::now()).await;
    assert!(matches!(rejected, Err(PushError::Closed(_))));

    // idempotent
    queue.close().await;
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_bounded_rejects_later_pushes() {
    let (queue, mut out) = DeadlineQueue::new(bounded(4));
    let now = Instant::now();
    queue
        .push(now + Duration::from_millis(50))
        .await
        .expect("queue open");

    let consumer = tokio::spawn(async move {
        let mut n = 0;
        while out.recv().await.is_some() {
            n += 1;
        }
        n
    });

    queue.close().await;
    assert_eq!(consumer.await.expect("consumer finished"), 1);

    let err = queue
        .push(now)
        .await
        .expect_err("input closed");
    assert_eq!(err.as_label(), "push_closed");
    assert_eq!(err.into_inner(), now);
    assert!(queue.input().send(now).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_without_consumer_does_not_block() {
    let (queue, mut out) = DeadlineQueue::new(unbounded());
    let now = Instant::now();
    for _ in 0..3 {
        queue.push(now).await.expect("queue open");
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    queue.shutdown().await;

    let mut drained = 0_u64;
    while out.recv().await.is_some() {
        drained += 1;
    }
    let stats = queue.stats().await;
    assert_eq!(stats.popped, drained);
    assert_balanced(stats, queue.len().await);

    assert!(queue.is_closed());
    assert!(queue.push(now).await.is_err());
    queue.shutdown().await;
    queue.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_blocked_close() {
    let (queue, _out) = DeadlineQueue::new(unbounded());
    let queue = Arc::new(queue);
    let now = Instant::now();
    for _ in 0..3 {
        queue.push(now).await.expect("queue open");
    }

    let closer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.close().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!closer.is_finished());

    queue.shutdown().await;
    closer.await.expect("close returned");
    assert_balanced(queue.stats().await, queue.len().await);
}

#[tokio::test(start_paused = true)]
async fn test_clear_returns_removed_count_and_restarts() {
    let (queue, mut out) = DeadlineQueue::new(unbounded());
    let now = Instant::now();
    for s in 1..=4_u64 {
        queue
            .push(now + Duration::from_secs(60 * s))
            .await
            .expect("queue open");
    }

    let before = queue.stats().await.cleared;
    let removed = queue.clear().await;
    let after = queue.stats().await;
    assert_eq!(removed, 4);
    assert_eq!(after.cleared - before, removed as u64);
    assert!(queue.is_empty().await);
    assert_balanced(after, 0);

    let at = Instant::now() + Duration::from_millis(10);
    queue.push(at).await.expect("queue open");
    assert_eq!(out.recv().await, Some(at));
    assert_eq!(queue.clear().await, 0);
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_releases_suspended_producer() {
    let (queue, _out) = DeadlineQueue::new(bounded(2));
    let queue = Arc::new(queue);
    let far = Instant::now() + Duration::from_secs(3600);

    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            for _ in 0..4 {
                queue.push(far).await.expect("queue open");
            }
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(queue.len().await, 2);
    assert!(!producer.is_finished());

    assert_eq!(queue.clear().await, 2);
    producer.await.expect("producer finished");
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(queue.len().await, 2);
    let stats = queue.stats().await;
    assert_eq!((stats.pushed, stats.cleared), (4, 2));
    assert_balanced(stats, 2);
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_outer_token_stops_processes() {
    let outer = CancellationToken::new();
    let (queue, mut out) = DeadlineQueue::builder(unbounded())
        .with_name("scoped")
        .with_token(outer.clone())
        .build();
    assert_eq!(queue.name(), "scoped");

    outer.cancel();
    queue
        .push(Instant::now())
        .await
        .expect("unbounded push still accepted");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(queue.len().await, 1);

    // no restart once cancelled
    assert_eq!(queue.clear().await, 1);
    queue.shutdown().await;
    assert!(out.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_drop_closes_output() {
    let (queue, mut out) = DeadlineQueue::new(unbounded());
    queue
        .push(Instant::now() + Duration::from_secs(5))
        .await
        .expect("queue open");
    drop(queue);
    assert!(out.recv().await.is_none());
}

struct Recorder(Arc<Mutex<Vec<EventKind>>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.0.lock().expect("recorder lock").push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_observe_queue_events() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder(Arc::clone(&seen)))];
    let (queue, mut out) = DeadlineQueue::builder(bounded(1))
        .with_subscribers(subs)
        .build();

    let now = Instant::now();
    queue
        .push(now + Duration::from_secs(2))
        .await
        .expect("queue open");
    assert!(out.recv().await.is_some());
    queue.clear().await;
    queue.shutdown().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let seen = seen.lock().expect("recorder lock").clone();
    for kind in [
        EventKind::WorkerSpawned,
        EventKind::IntakeSuspended,
        EventKind::IntakeResumed,
        EventKind::QueueCleared,
        EventKind::QueueShutdown,
    ] {
        assert!(seen.contains(&kind), "missing {kind:?} in {seen:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clear_and_shutdown_never_panic() {
    for round in 0..500_u64 {
        let (queue, _out) = DeadlineQueue::new(unbounded());
        let queue = Arc::new(queue);
        queue
            .push(Instant::now() + Duration::from_secs(60))
            .await
            .expect("queue open");

        let clearer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.clear().await })
        };
        let stopper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.shutdown().await })
        };

        let removed = clearer
            .await
            .unwrap_or_else(|e| panic!("clear failed in round {round}: {e}"));
        stopper
            .await
            .unwrap_or_else(|e| panic!("shutdown failed in round {round}: {e}"));
        assert!(removed <= 1);
        assert!(queue.is_closed());
        assert_balanced(queue.stats().await, queue.len().await);
    }
}

#[tokio::test(start_paused = true)]
async fn test_bounded_reorders_within_capacity_window() {
    let (queue, mut out) = DeadlineQueue::new(bounded(5));
    let now = Instant::now();
    for ms in [50_u64, 40, 30, 20, 10] {
        queue
            .push(now + Duration::from_millis(ms))
            .await
            .expect("queue open");
    }

    let mut released = Vec::with_capacity(5);
    for _ in 0..5 {
        let at = out.recv().await.expect("item released");
        assert!(Instant::now() >= at);
        released.push(at);
    }
    let expected: Vec<Instant> = [10_u64, 20, 30, 40, 50]
        .iter()
        .map(|ms| now + Duration::from_millis(*ms))
        .collect();
    assert_eq!(released, expected);
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_full_bounded_queue_flushes_accepted_items() {
    let (queue, mut out) = DeadlineQueue::new(bounded(2));
    let queue = Arc::new(queue);
    let now = Instant::now();

    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            let mut accepted = 0_u64;
            for i in 1..=6_u64 {
                if queue.push(now + Duration::from_millis(100 * i)).await.is_ok() {
                    accepted += 1;
                }
            }
            accepted
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(queue.len().await, 2);
    assert!(!producer.is_finished());

    let consumer = tokio::spawn(async move {
        let mut items = Vec::new();
        while let Some(item) = out.recv().await {
            items.push(item);
        }
        items
    });

    queue.close().await;
    let accepted = producer.await.expect("producer finished");
    let items = consumer.await.expect("consumer finished");

    let stats = queue.stats().await;
    assert_eq!(accepted, 3);
    assert_eq!(items.len() as u64, accepted);
    assert_eq!(stats.pushed, accepted);
    assert_eq!(stats.pushed - stats.cleared, items.len() as u64);
    assert!(items.windows(2).all(|w| w[0] <= w[1]));
    assert!(queue.is_empty().await);
}
