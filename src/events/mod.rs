//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by controllers, the deadline queue
//! processes and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Controller` (worker lifecycle), `DeadlineQueue` and its
//!   intake/release processes, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `SubscriberSet::listen`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
