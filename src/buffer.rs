//! Capacity-limited, insertion-ordered buffer backing the live feed and the error vault.

use std::collections::VecDeque;

/// Default capacity of the live feed.
pub const LIVE_CAPACITY: usize = 2000;

#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Append to the tail, then evict from the head until within capacity.
    /// Returns how many items were evicted.
    pub fn push(&mut self, item: T) -> usize {
        self.items.push_back(item);
        let n = self.items.len();
        if n > self.capacity {
            let excess = n - self.capacity;
            self.items.drain(0..excess);
            excess
        } else {
            0
        }
    }

    /// Changing the capacity never evicts on its own; a lower limit is
    /// enforced by the next [`push`](Self::push).
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Oldest first.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &T> + DoubleEndedIterator {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
