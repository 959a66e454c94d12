//! # Controller: supervises a family of workers sharing one cancellation scope.
//!
//! ## Architecture
//! ```text
//!               ┌───────────── Family (shared by every derived handle) ──────────┐
//!               │  name · CancellationToken · TaskTracker · fault slot            │
//!               └─────────────▲───────────────────▲───────────────────▲──────────┘
//!                             │                   │                   │
//! Controller::new ──► handle (scope) ──derive──► handle (scope+value) ──derive──► handle (scope+deadline)
//!                             │                   │                   │
//!                       spawn(worker)       spawn(worker)       spawn(worker)
//!                             ▼                   ▼                   ▼
//!                     tracker.spawn(worker(Scope)) ... catch_unwind ... WorkerExited
//! ```
//!
//! ## Rules
//! - Derived handles are **not** child scopes: cancelling any handle cancels the family.
//! - `spawn`/`derive_*` on a dead handle are programming errors and panic.
//! - `shutdown` cancels first, then waits; `wait_exit` waits first, then cancels.
//! - A panic in a plain `spawn` worker cancels the family and is re-raised from the
//!   next `shutdown`/`wait_exit`. `spawn_recoverable` hands it to a handler instead.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use deadq::Controller;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ctrl = Controller::new("pollers");
//!     ctrl.derive_with_timeout(Duration::from_millis(20))
//!         .spawn(|scope| async move {
//!             scope.cancelled().await;
//!         })
//!         .wait_exit()
//!         .await;
//!     assert!(ctrl.is_dead());
//! }
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::controller::scope::Scope;
use crate::error::WorkerFault;
use crate::events::{Bus, Event, EventKind};

/// State shared by every handle of one controller family.
struct Family {
    name: Arc<str>,
    token: CancellationToken,
    tracker: TaskTracker,
    /// First panic payload raised by a plain `spawn` worker.
    fault: Mutex<Option<Box<dyn Any + Send>>>,
    cancel_published: AtomicBool,
}

impl Family {
    fn record_fault(&self, payload: Box<dyn Any + Send>) {
        let mut slot = self.fault.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(payload);
        }
    }

    fn take_fault(&self) -> Option<Box<dyn Any + Send>> {
        self.fault.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Handle to a family of supervised workers.
///
/// Cloning or deriving a handle never creates a new cancellation scope.
#[derive(Clone)]
pub struct Controller {
    family: Arc<Family>,
    scope: Scope,
    bus: Option<Bus>,
}

impl Controller {
    /// Creates a root controller with a fresh cancellation token.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::from_token(name.into(), CancellationToken::new())
    }

    /// Creates a controller bound to an outer scope: cancelling `parent`
    /// cancels the whole family, but not the other way around.
    pub fn with_parent(name: impl Into<Arc<str>>, parent: &CancellationToken) -> Self {
        Self::from_token(name.into(), parent.child_token())
    }

    fn from_token(name: Arc<str>, token: CancellationToken) -> Self {
        Self {
            scope: Scope::new(token.clone()),
            family: Arc::new(Family {
                name,
                token,
                tracker: TaskTracker::new(),
                fault: Mutex::new(None),
                cancel_published: AtomicBool::new(false),
            }),
            bus: None,
        }
    }

    /// Attaches an event bus; worker lifecycle events are published on it.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the controller name.
    pub fn name(&self) -> &str {
        &self.family.name
    }

    /// Returns the scope workers spawned from this handle receive.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the number of workers currently alive in the family.
    pub fn live_workers(&self) -> usize {
        self.family.tracker.len()
    }

    /// Returns true once the family is cancelled or this handle's deadline has elapsed.
    pub fn is_dead(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Runs `worker` concurrently, passing it this handle's scope.
    ///
    /// # Panics
    /// Panics if the controller is already dead.
    pub fn spawn<F, Fut>(&self, worker: F) -> &Self
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.ensure_live("spawn");
        self.launch(self.scope.clone(), worker, None::<fn(WorkerFault)>);
        self
    }

    /// Like [`spawn`](Self::spawn), but returns `false` instead of panicking when the
    /// controller is already dead.
    pub(crate) fn try_spawn<F, Fut>(&self, worker: F) -> bool
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_dead() {
            return false;
        }
        self.launch(self.scope.clone(), worker, None::<fn(WorkerFault)>);
        true
    }

    /// Runs `worker` concurrently; a panic inside it is caught and handed to `on_fault`.
    ///
    /// The worker counts as exited once `on_fault` returns.
    ///
    /// # Panics
    /// Panics if the controller is already dead.
    pub fn spawn_recoverable<F, Fut, H>(&self, worker: F, on_fault: H) -> &Self
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        H: FnOnce(WorkerFault) + Send + 'static,
    {
        self.ensure_live("spawn");
        self.launch(self.scope.clone(), worker, Some(on_fault));
        self
    }

    /// Like [`spawn`](Self::spawn), but the worker's scope expires after `timeout`.
    pub fn spawn_with_timeout<F, Fut>(&self, worker: F, timeout: Duration) -> &Self
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.ensure_live("spawn");
        let scope = self.scope.with_deadline(Instant::now() + timeout);
        self.launch(scope, worker, None::<fn(WorkerFault)>);
        self
    }

    /// Like [`spawn_recoverable`](Self::spawn_recoverable), but the worker's scope
    /// expires after `timeout`.
    pub fn spawn_recoverable_with_timeout<F, Fut, H>(
        &self,
        worker: F,
        on_fault: H,
        timeout: Duration,
    ) -> &Self
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        H: FnOnce(WorkerFault) + Send + 'static,
    {
        self.ensure_live("spawn");
        let scope = self.scope.with_deadline(Instant::now() + timeout);
        self.launch(scope, worker, Some(on_fault));
        self
    }

    /// Returns a handle whose workers additionally see `value` under `key`.
    ///
    /// # Panics
    /// Panics if the controller is already dead.
    pub fn derive_with_value<V>(&self, key: &'static str, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.ensure_live("derive");
        Self {
            family: Arc::clone(&self.family),
            scope: self.scope.with_value(key, Arc::new(value)),
            bus: self.bus.clone(),
        }
    }

    /// Returns a handle whose workers expire at `deadline` (or earlier, if inherited).
    ///
    /// # Panics
    /// Panics if the controller is already dead.
    pub fn derive_with_deadline(&self, deadline: Instant) -> Self {
        self.ensure_live("derive");
        Self {
            family: Arc::clone(&self.family),
            scope: self.scope.with_deadline(deadline),
            bus: self.bus.clone(),
        }
    }

    /// Returns a handle whose workers expire `timeout` from now.
    ///
    /// # Panics
    /// Panics if the controller is already dead.
    pub fn derive_with_timeout(&self, timeout: Duration) -> Self {
        self.derive_with_deadline(Instant::now() + timeout)
    }

    /// Cancels the family and waits until every live worker has returned.
    ///
    /// Re-raises the first panic of a plain `spawn` worker, if any.
    pub async fn shutdown(&self) {
        self.cancel();
        self.family.tracker.close();
        self.family.tracker.wait().await;
        self.rethrow_fault();
    }

    /// Waits until every live worker has returned on its own, then cancels the family.
    ///
    /// Re-raises the first panic of a plain `spawn` worker, if any.
    pub async fn wait_exit(&self) {
        self.family.tracker.close();
        self.family.tracker.wait().await;
        self.cancel();
        self.rethrow_fault();
    }

    fn cancel(&self) {
        self.family.token.cancel();
        if !self.family.cancel_published.swap(true, Ordering::AcqRel) {
            self.publish(Event::new(EventKind::ControllerCancelled));
        }
    }

    fn rethrow_fault(&self) {
        if let Some(payload) = self.family.take_fault() {
            std::panic::resume_unwind(payload);
        }
    }

    fn ensure_live(&self, op: &str) {
        if self.is_dead() {
            panic!("controller `{}` is dead: cannot {op}", self.family.name);
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev.with_source(Arc::clone(&self.family.name)));
        }
    }

    fn launch<F, Fut, H>(&self, scope: Scope, worker: F, on_fault: Option<H>)
    where
        F: FnOnce(Scope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        H: FnOnce(WorkerFault) + Send + 'static,
    {
        let family = Arc::clone(&self.family);
        let reporter = self.clone();
        self.publish(Event::new(EventKind::WorkerSpawned));

        self.family.tracker.spawn(async move {
            let run = AssertUnwindSafe(async move { worker(scope).await }).catch_unwind();
            if let Err(payload) = run.await {
                let fault = WorkerFault::from_panic(Arc::clone(&family.name), &*payload);
                reporter.publish(
                    Event::new(EventKind::WorkerFaulted).with_reason(fault.message.as_str()),
                );
                match on_fault {
                    Some(handler) => handler(fault),
                    None => {
                        family.token.cancel();
                        family.record_fault(payload);
                    }
                }
            }
            reporter.publish(Event::new(EventKind::WorkerExited));
        });
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.family.name)
            .field("live_workers", &self.family.tracker.len())
            .field("scope", &self.scope)
            .finish()
    }
}
