//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used to deliver events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Controller / DeadlineQueue ── publish(Event) ──► Bus ──► SubscriberSet::listen
//!                                                              │
//!                                                         ┌────┴────┬─────────┐
//!                                                         ▼         ▼         ▼
//!                                                     LogWriter  Metrics   Custom
//! ```
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] _(demo/reference only)_.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
