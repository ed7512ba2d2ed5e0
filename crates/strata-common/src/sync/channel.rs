//! An unbounded blocking FIFO channel.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// A concurrent FIFO with non-blocking `put` and blocking `get`.
///
/// There is no capacity bound; producers and consumers are expected to
/// cooperate on backpressure. Any number of threads may call either
/// side.
pub struct Channel<T> {
    queue: Mutex<VecDeque<T>>,
    condvar: Condvar,
}

impl<T> Channel<T> {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    /// Appends an element and wakes one waiting consumer.
    pub fn put(&self, element: T) {
        let mut queue = self.queue.lock();
        queue.push_back(element);
        drop(queue);
        self.condvar.notify_one();
    }

    /// Removes and returns the front element, blocking while the channel
    /// is empty.
    pub fn get(&self) -> T {
        let mut queue = self.queue.lock();
        while queue.is_empty() {
            self.condvar.wait(&mut queue);
        }
        queue.pop_front().expect("queue non-empty after wait")
    }

    /// Returns the number of queued elements.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true if no elements are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}
