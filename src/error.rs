//! Error types used by the queue and the controller.
//!
//! This module defines:
//!
//! - [`PushError`]: an item could not be accepted by a [`DeadlineQueue`](crate::DeadlineQueue).
//! - [`WorkerFault`]: a panic caught inside a worker spawned with
//!   [`Controller::spawn_recoverable`](crate::Controller::spawn_recoverable).
//!
//! Precondition violations (spawning on a dead controller, peeking an empty heap) are
//! not represented here: they panic at the call site.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// # Errors returned when pushing into a deadline queue.
///
/// The rejected item is handed back to the caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PushError<T> {
    /// The queue input was closed by [`close`](crate::DeadlineQueue::close) or
    /// [`shutdown`](crate::DeadlineQueue::shutdown).
    #[error("deadline queue input is closed")]
    Closed(T),
}

impl<T> PushError<T> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use deadq::PushError;
    ///
    /// let err = PushError::Closed(42);
    /// assert_eq!(err.as_label(), "push_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PushError::Closed(_) => "push_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PushError::Closed(_) => "input closed, item rejected".to_string(),
        }
    }

    /// Consumes the error, returning the rejected item.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Closed(item) => item,
        }
    }
}

/// # A panic captured inside a supervised worker.
///
/// Produced by [`Controller::spawn_recoverable`](crate::Controller::spawn_recoverable)
/// and handed to the fault handler instead of unwinding further.
#[derive(Error, Debug, Clone)]
#[error("worker of `{controller}` panicked: {message}")]
pub struct WorkerFault {
    /// Name of the controller that owned the worker.
    pub controller: Arc<str>,
    /// Panic message (or `"unknown panic"` for non-string payloads).
    pub message: String,
}

impl WorkerFault {
    pub(crate) fn from_panic(controller: Arc<str>, payload: &(dyn Any + Send)) -> Self {
        Self {
            controller,
            message: panic_message(payload),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use deadq::WorkerFault;
    ///
    /// let fault = WorkerFault { controller: "intake".into(), message: "boom".into() };
    /// assert_eq!(fault.as_label(), "worker_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        "worker_panicked"
    }

    /// Returns a human-readable message with details about the fault.
    pub fn as_message(&self) -> String {
        format!("controller={} panic={}", self.controller, self.message)
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_error_returns_item() {
        let err = PushError::Closed("payload");
        assert_eq!(err.to_string(), "deadline queue input is closed");
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");

        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_worker_fault_display() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let fault = WorkerFault::from_panic("release".into(), payload.as_ref());
        assert_eq!(fault.to_string(), "worker of `release` panicked: boom");
        assert_eq!(fault.as_message(), "controller=release panic=boom");
    }
}
