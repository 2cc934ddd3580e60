//! Bounded, newest-last history buffer.

use std::collections::VecDeque;

/// Keeps the most recent `capacity` items.
#[derive(Debug, Clone)]
pub struct History<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> History<T> {
    /// A capacity of 0 keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// The last `n` items accepted by `filter`, oldest first.
    pub fn recent_matching(&self, n: usize, filter: impl Fn(&T) -> bool) -> Vec<T> {
        let mut out: Vec<T> = self
            .items
            .iter()
            .rev()
            .filter(|item| filter(item))
            .take(n)
            .cloned()
            .collect();
        out.reverse();
        out
    }

    /// The last `n` items, oldest first.
    pub fn recent(&self, n: usize) -> Vec<T> {
        self.recent_matching(n, |_| true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
