//! Fixed-capacity FIFO handoff queue.

use parking_lot::Mutex;
use thiserror::Error;

/// Returned by [`HandoffQueue::push`] when the ring is at capacity.
///
/// Carries the rejected item back to the caller so nothing is lost.
#[derive(Debug, Error)]
#[error("handoff queue is full")]
pub struct PushError<T>(pub T);

/// A fixed-capacity FIFO queue for handing work items between two roles.
///
/// The capacity is set at construction and never changes. Callers are
/// expected to pair `push`/`pop` with semaphore permits so that a push only
/// happens when room is known to exist and a pop only when an item is known
/// to exist; the full/empty outcomes are defensive, not normal control flow.
pub struct HandoffQueue<T> {
    ring: Mutex<Ring<T>>,
}

struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> HandoffQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "handoff queue capacity must be at least 1");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                len: 0,
            }),
        }
    }

    /// Append an item, failing (and returning it) if the ring is full.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut ring = self.ring.lock();
        if ring.len == ring.slots.len() {
            return Err(PushError(item));
        }
        let tail = (ring.head + ring.len) % ring.slots.len();
        ring.slots[tail] = Some(item);
        ring.len += 1;
        Ok(())
    }

    /// Remove and return the oldest item, or `None` if the ring is empty.
    pub fn pop(&self) -> Option<T> {
        let mut ring = self.ring.lock();
        if ring.len == 0 {
            return None;
        }
        let head = ring.head;
        let item = ring.slots[head].take();
        ring.head = (head + 1) % ring.slots.len();
        ring.len -= 1;
        item
    }

    /// Drop all queued items.
    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        for slot in ring.slots.iter_mut() {
            *slot = None;
        }
        ring.head = 0;
        ring.len = 0;
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.ring.lock().len
    }

    /// True if no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items the queue can hold.
    pub fn capacity(&self) -> usize {
        self.ring.lock().slots.len()
    }
}
