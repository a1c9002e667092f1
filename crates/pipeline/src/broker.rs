//! Broker for one producer role and one consumer role.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::queue::HandoffQueue;
use crate::sync::Semaphore;

/// Which of the two roles runs on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderRole {
    /// The calling thread produces; the consumer runs on a spawned thread.
    Producer,
    /// The calling thread consumes; the producer runs on a spawned thread.
    Consumer,
    /// Let the broker assign roles to threads.
    #[default]
    Unspecified,
}

/// Orchestrates a producer and a consumer over a bounded handoff queue.
///
/// The producer is a closure returning `Ok(Some(item))` per work item and
/// `Ok(None)` on exhaustion; the consumer accepts items in production order.
/// The producer may run at most `look_ahead` items ahead of the consumer.
///
/// A failure in either role stops the run: the other role is signaled at its
/// next suspension point rather than interrupted, and the error is returned
/// once both roles have stopped. If both roles fail, the producer's error is
/// reported.
#[derive(Debug, Clone, Copy)]
pub struct Broker {
    look_ahead: usize,
    leader: LeaderRole,
}

impl Broker {
    /// Create a broker with the given look-ahead depth.
    ///
    /// # Panics
    ///
    /// Panics if `look_ahead` is zero.
    pub fn new(look_ahead: usize) -> Self {
        assert!(look_ahead > 0, "broker look-ahead must be at least 1");
        Self {
            look_ahead,
            leader: LeaderRole::Unspecified,
        }
    }

    /// Choose which role runs on the calling thread.
    pub fn with_leader(mut self, leader: LeaderRole) -> Self {
        self.leader = leader;
        self
    }

    /// Look-ahead depth of this broker.
    pub fn look_ahead(&self) -> usize {
        self.look_ahead
    }

    /// Run both roles to completion, one on the calling thread and one on a
    /// scoped worker thread.
    pub fn run<T, E, P, C>(&self, produce: P, consume: C) -> Result<(), E>
    where
        T: Send,
        E: Send,
        P: FnMut() -> Result<Option<T>, E> + Send,
        C: FnMut(T) -> Result<(), E> + Send,
    {
        let shared = Shared {
            queue: HandoffQueue::new(self.look_ahead),
            slots: Semaphore::new(self.look_ahead),
            items: Semaphore::new(0),
            consumer_stopped: AtomicBool::new(false),
        };

        let (producer_err, consumer_err) = thread::scope(|scope| match self.leader {
            LeaderRole::Consumer => {
                let producer = scope.spawn(|| producer_role(&shared, produce));
                let consumer_err = consumer_role(&shared, consume);
                (join_role(producer), consumer_err)
            }
            // The calling thread deterministically takes the producer role
            // when none is specified.
            LeaderRole::Producer | LeaderRole::Unspecified => {
                let consumer = scope.spawn(|| consumer_role(&shared, consume));
                let producer_err = producer_role(&shared, produce);
                (producer_err, join_role(consumer))
            }
        });

        match (producer_err, consumer_err) {
            (Some(err), _) => Err(err),
            (None, Some(err)) => Err(err),
            (None, None) => Ok(()),
        }
    }

    /// Run both roles on the calling thread in strict alternation.
    ///
    /// Behaviorally equivalent to [`run`](Self::run) (same consume calls in
    /// the same order), only without overlap; the look-ahead depth has no
    /// effect here.
    pub fn run_sequential<T, E, P, C>(&self, mut produce: P, mut consume: C) -> Result<(), E>
    where
        P: FnMut() -> Result<Option<T>, E>,
        C: FnMut(T) -> Result<(), E>,
    {
        while let Some(item) = produce()? {
            consume(item)?;
        }
        Ok(())
    }
}

struct Shared<T> {
    queue: HandoffQueue<T>,
    /// Counts slots the producer may still fill.
    slots: Semaphore,
    /// Counts items ready for the consumer.
    items: Semaphore,
    consumer_stopped: AtomicBool,
}

fn producer_role<T, E>(
    shared: &Shared<T>,
    mut produce: impl FnMut() -> Result<Option<T>, E>,
) -> Option<E> {
    let mut produced = 0usize;
    let mut failure = None;
    loop {
        shared.slots.acquire(1);
        if shared.consumer_stopped.load(Ordering::Acquire) {
            break;
        }
        match produce() {
            Ok(Some(item)) => {
                if shared.queue.push(item).is_err() {
                    // A slot permit is held, so the ring cannot be full.
                    unreachable!("handoff queue overflowed with a slot permit held");
                }
                produced += 1;
                shared.items.release(1);
            }
            Ok(None) => break,
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }
    // One extra item permit so a blocked consumer wakes and observes the
    // empty queue as the termination signal.
    shared.items.release(1);
    tracing::debug!(produced, failed = failure.is_some(), "producer role finished");
    failure
}

fn consumer_role<T, E>(
    shared: &Shared<T>,
    mut consume: impl FnMut(T) -> Result<(), E>,
) -> Option<E> {
    let mut consumed = 0usize;
    let mut failure = None;
    loop {
        shared.items.acquire(1);
        let Some(item) = shared.queue.pop() else {
            // An item permit with nothing queued signals producer
            // termination.
            break;
        };
        match consume(item) {
            Ok(()) => {
                consumed += 1;
                shared.slots.release(1);
            }
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }
    shared.consumer_stopped.store(true, Ordering::Release);
    // One extra slot permit so a blocked producer wakes and observes the
    // stop flag.
    shared.slots.release(1);
    tracing::debug!(consumed, failed = failure.is_some(), "consumer role finished");
    failure
}

fn join_role<E>(handle: thread::ScopedJoinHandle<'_, Option<E>>) -> Option<E> {
    match handle.join() {
        Ok(failure) => failure,
        Err(payload) => panic::resume_unwind(payload),
    }
}
