//! Counting semaphore built on a lock and condition variable.

use parking_lot::{Condvar, Mutex};

/// A counting semaphore with blocking acquire.
///
/// The count never goes negative: `acquire(n)` blocks until at least `n`
/// permits are available and then takes them atomically, so a waiter asking
/// for several permits cannot be starved into a partial take.
pub struct Semaphore {
    count: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits.
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Block until `amount` permits are available, then take them.
    pub fn acquire(&self, amount: usize) {
        let mut count = self.count.lock();
        while *count < amount {
            self.available.wait(&mut count);
        }
        *count -= amount;
    }

    /// Take `amount` permits if they are available right now.
    ///
    /// Returns `true` on success without ever blocking.
    pub fn try_acquire(&self, amount: usize) -> bool {
        let mut count = self.count.lock();
        if *count >= amount {
            *count -= amount;
            true
        } else {
            false
        }
    }

    /// Return `amount` permits and wake blocked acquirers.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is zero; releasing nothing is always a caller bug.
    pub fn release(&self, amount: usize) {
        assert!(amount > 0, "semaphore release of zero permits");
        let mut count = self.count.lock();
        *count += amount;
        // Waiters may ask for more than one permit, so wake everyone and let
        // them re-check the count.
        self.available.notify_all();
    }

    /// Number of permits currently available.
    pub fn permits(&self) -> usize {
        *self.count.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_release() {
        let sem = Semaphore::new(2);
        sem.acquire(1);
        sem.acquire(1);
        assert_eq!(sem.permits(), 0);
        sem.release(2);
        assert_eq!(sem.permits(), 2);
    }

    #[test]
    fn test_try_acquire_fails_when_exhausted() {
        let sem = Semaphore::new(1);
        assert!(sem.try_acquire(1));
        assert!(!sem.try_acquire(1));
        sem.release(1);
        assert!(sem.try_acquire(1));
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || {
                sem.acquire(3);
            })
        };
        // Give the waiter time to block, then hand over permits in pieces.
        thread::sleep(Duration::from_millis(20));
        sem.release(1);
        sem.release(2);
        waiter.join().unwrap();
        assert_eq!(sem.permits(), 0);
    }

    #[test]
    fn test_multi_permit_acquire_is_atomic() {
        let sem = Semaphore::new(3);
        sem.acquire(3);
        assert!(!sem.try_acquire(1));
        sem.release(3);
        assert_eq!(sem.permits(), 3);
    }

    #[test]
    #[should_panic(expected = "zero permits")]
    fn test_release_zero_panics() {
        Semaphore::new(0).release(0);
    }
}
