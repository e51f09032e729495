//! Blocking FIFO queue for cross-thread hand-off
//!
//! The only blocking primitive in the bridge: a runtime's dedicated thread
//! parks in `pop` until work arrives from another thread.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

pub struct ThreadSafeQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> ThreadSafeQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        let mut items = self.items.lock().unwrap();
        items.push_back(item);
        self.available.notify_one();
    }

    /// Block until an item is available, then return the oldest one.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock().unwrap();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = self.available.wait(items).unwrap();
        }
    }

    /// Non-blocking variant of [`pop`](Self::pop).
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

impl<T> Default for ThreadSafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
