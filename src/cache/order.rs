//! Insertion Order Module
//!
//! Remembers the order in which keys were first inserted so the cache can
//! evict the oldest one when full. Reads and overwrites do not reorder keys.

use std::collections::VecDeque;

// == Insertion Order ==
/// FIFO record of cache keys.
///
/// - Front = oldest insertion
/// - Back = newest insertion
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Appends a newly inserted key. Keys already present keep their place.
    pub fn push(&mut self, key: &str) {
        if !self.contains(key) {
            self.order.push_back(key.to_string());
        }
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and forgets the earliest inserted key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
