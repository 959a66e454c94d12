//! # Array-backed binary heap.
//!
//! [`PriorityQueue`] keeps items in a `Vec` laid out as an implicit binary tree
//! (children of `i` at `2i+1` and `2i+2`) and restores the heap property with
//! index-based sift-up/sift-down after every mutation.
//!
//! ## Rules
//! - The extreme item is always at index 0: the minimum priority for
//!   [`Order::Ascending`], the maximum for [`Order::Descending`].
//! - Ties are not stable; equal priorities come out in unspecified order.
//! - `peek`/`pop` on an empty queue are precondition violations and panic.
//!
//! ## Example
//! ```rust
//! use deadq::{Order, PriorityQueue, Prioritized};
//!
//! struct Job(i64);
//! impl Prioritized for Job {
//!     fn priority(&self) -> i64 { self.0 }
//! }
//!
//! let mut pq = PriorityQueue::new(Order::Ascending);
//! pq.push(Job(30));
//! pq.push(Job(10));
//! pq.push(Job(20));
//!
//! assert_eq!(pq.peek().0, 10);
//! assert_eq!(pq.pop().0, 10);
//! assert_eq!(pq.pop().0, 20);
//! assert_eq!(pq.len(), 1);
//! ```

/// An item that reports an integer priority.
pub trait Prioritized {
    /// Ordering key of the item.
    fn priority(&self) -> i64;
}

/// Direction of a [`PriorityQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Smallest priority first.
    #[default]
    Ascending,
    /// Largest priority first.
    Descending,
}

impl Order {
    /// Returns true if `a` must sit above `b` in the heap.
    #[inline]
    fn precedes(self, a: i64, b: i64) -> bool {
        match self {
            Order::Ascending => a < b,
            Order::Descending => b < a,
        }
    }
}

/// Binary heap ordered by [`Prioritized::priority`].
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    items: Vec<T>,
    order: Order,
}

impl<T: Prioritized> PriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new(order: Order) -> Self {
        Self::with_capacity(order, 0)
    }

    /// Creates an empty queue with room for `capacity` items.
    pub fn with_capacity(order: Order, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            order,
        }
    }

    /// Returns the ordering direction.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts an item in `O(log n)`.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        let last = self.items.len() - 1;
        self.sift_up(last);
    }

    /// Removes and returns the extreme item.
    ///
    /// # Panics
    /// Panics if the queue is empty.
    pub fn pop(&mut self) -> T {
        assert!(!self.items.is_empty(), "pop on an empty priority queue");
        let item = self.items.swap_remove(0);
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        item
    }

    /// Returns the extreme item without removing it.
    ///
    /// # Panics
    /// Panics if the queue is empty.
    pub fn peek(&self) -> &T {
        assert!(!self.items.is_empty(), "peek on an empty priority queue");
        &self.items[0]
    }

    /// Discards every item and returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    #[inline]
    fn precedes(&self, i: usize, j: usize) -> bool {
        self.order
            .precedes(self.items[i].priority(), self.items[j].priority())
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if !self.precedes(child, parent) {
                break;
            }
            self.items.swap(child, parent);
            child = parent;
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * parent + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut best = left;
            if right < len && self.precedes(right, left) {
                best = right;
            }
            if !self.precedes(best, parent) {
                break;
            }
            self.items.swap(parent, best);
            parent = best;
        }
    }
}
