//! FIFO work queue with writer-count exhaustion tracking.
//!
//! A queue's writer count is fixed at pipeline wiring time (one slot per
//! upstream worker) and decremented monotonically as those workers
//! terminate. The queue is exhausted only when it is empty AND the writer
//! count has reached zero; an empty queue with live writers just means
//! "nothing available right now".
//!
//! Waiting readers are woken by a notification on enqueue and on the last
//! writer closing, instead of the fixed-interval polling a naive
//! implementation would use.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Unbounded FIFO queue with a monotonically decreasing writer count.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    writers: AtomicUsize,
    notify: Notify,
}

impl<T> WorkQueue<T> {
    /// Creates a queue expecting `writers` upstream writer slots.
    #[must_use]
    pub fn new(writers: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            writers: AtomicUsize::new(writers),
            notify: Notify::new(),
        }
    }

    /// Appends one item and wakes a waiting reader.
    pub fn enqueue(&self, item: T) {
        debug_assert!(self.writer_count() > 0, "enqueue after all writers closed");
        self.items.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Appends a batch of items in order.
    pub fn enqueue_all(&self, items: impl IntoIterator<Item = T>) {
        let mut queue = self.items.lock();
        let before = queue.len();
        queue.extend(items);
        let added = queue.len() - before;
        drop(queue);
        for _ in 0..added {
            self.notify.notify_one();
        }
    }

    /// Removes and returns the head item, if one is available right now.
    #[must_use]
    pub fn try_dequeue(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Removes and returns the head item, waiting while the queue is
    /// empty but writers remain. Returns `None` once the queue is
    /// permanently exhausted (empty with zero writers).
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            if let Some(item) = self.try_dequeue() {
                return Some(item);
            }
            if self.writer_count() == 0 {
                // A writer may have enqueued and closed between the two
                // checks above.
                if let Some(item) = self.try_dequeue() {
                    return Some(item);
                }
                // Pass the wakeup on so every other waiter also observes
                // exhaustion.
                self.notify.notify_one();
                return None;
            }
            self.notify.notified().await;
        }
    }

    /// Releases one writer slot. Called exactly once by each upstream
    /// worker when it terminates.
    pub fn close_writer(&self) {
        let previous = self.writers.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "close_writer called more times than writers");
        if previous == 1 {
            self.notify.notify_one();
        }
    }

    /// Remaining writer slots.
    #[must_use]
    pub fn writer_count(&self) -> usize {
        self.writers.load(Ordering::Acquire)
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
