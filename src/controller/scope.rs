//! # Worker scope: cancellation, deadline and inherited values.
//!
//! A [`Scope`] is what every supervised worker receives. It bundles:
//! - the **family token** shared by every handle derived from one controller;
//! - an optional **deadline** owned by the handle that spawned the worker;
//! - a set of **inherited values** keyed by `&'static str`.
//!
//! ## Rules
//! - Cancellation is cooperative: workers poll [`Scope::is_cancelled`] or await
//!   [`Scope::cancelled`] at their suspension points.
//! - A deadline only affects workers spawned from the handle carrying it; it never
//!   cancels the family token.
//! - Deriving copies the per-handle fields (values, deadline) and shares the token.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Values = Arc<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>;

/// Cancellation/deadline/value context handed to a worker.
#[derive(Clone)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
    values: Values,
}

impl Scope {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            values: Arc::default(),
        }
    }

    /// Returns the family cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline carried by this scope, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the family is cancelled or the deadline has elapsed.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Completes when the family is cancelled or the deadline elapses.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(at) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(at) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Looks up an inherited value.
    ///
    /// Returns `None` for an unknown key or when the stored value is not a `V`.
    pub fn value<V: Any + Send + Sync>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|v| v.downcast_ref::<V>())
    }

    pub(crate) fn with_value(&self, key: &'static str, value: Arc<dyn Any + Send + Sync>) -> Self {
        let mut values = HashMap::clone(&self.values);
        values.insert(key, value);
        Self {
            token: self.token.clone(),
            deadline: self.deadline,
            values: Arc::new(values),
        }
    }

    /// The earlier of the inherited and the requested deadline wins.
    pub(crate) fn with_deadline(&self, at: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= at => current,
            _ => at,
        };
        Self {
            token: self.token.clone(),
            deadline: Some(deadline),
            values: Arc::clone(&self.values),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("cancelled", &self.token.is_cancelled())
            .field("deadline", &self.deadline)
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
