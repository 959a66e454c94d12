//! Priority heap used to hold pending items.
//!
//! ## Contents
//! - [`PriorityQueue`] array-backed binary heap
//! - [`Prioritized`] trait for items exposing an `i64` priority
//! - [`Order`] ascending (min-first) or descending (max-first)

mod priority_queue;

pub use priority_queue::{Order, Prioritized, PriorityQueue};
