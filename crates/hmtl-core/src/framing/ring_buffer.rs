//! Bounded, thread-safe FIFO that evicts its oldest item when full.
//!
//! Producers never block: [`RingBuffer::put`] always admits the new item and
//! drops the oldest unread one if the buffer is at capacity.  Consumers block
//! in [`RingBuffer::get`] for at most the wait they pass in.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub struct RingBuffer<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer.  A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `item`, returning the evicted oldest item if the buffer was full.
    pub fn put(&self, item: T) -> Option<T> {
        let mut items = self.lock();
        let evicted = if items.len() >= self.capacity {
            items.pop_front()
        } else {
            None
        };
        items.push_back(item);
        drop(items);
        self.available.notify_one();
        evicted
    }

    /// Removes the oldest item, waiting up to `wait` for one to arrive.
    ///
    /// Returns `None` if the wait expires with the buffer still empty.
    pub fn get(&self, wait: Duration) -> Option<T> {
        let deadline = Instant::now() + wait;
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            items = self
                .available
                .wait_timeout(items, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Removes the oldest item without waiting.
    pub fn try_get(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every buffered item.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panicking producer must not wedge consumers, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
