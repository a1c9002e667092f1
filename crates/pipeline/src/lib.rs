//! Two-role producer/consumer pipeline with bounded look-ahead.
//!
//! This crate coordinates exactly two roles: a producer that creates work
//! items and a consumer that processes them, connected through a
//! fixed-capacity handoff queue. Two counting semaphores implement the
//! classic bounded-buffer scheme: one counts slots the producer may still
//! fill, the other counts items ready for the consumer, so the producer can
//! run at most `look_ahead` items ahead of the consumer.
//!
//! # Architecture
//!
//! ```text
//! producer thread                 consumer thread
//!      │                               │
//!      ├─ acquire(slots) ◄─────────────┤ release(slots) after each item
//!      ├─ produce() ─► HandoffQueue ─► ├─ acquire(items), pop, consume()
//!      └─ release(items)               │
//! ```
//!
//! Termination is a handshake: a finished producer performs one extra
//! `items` release so a blocked consumer wakes and observes the empty queue;
//! a stopping consumer sets a shared flag and performs one extra `slots`
//! release so a blocked producer wakes and observes it. Errors raised by
//! either role are held until both roles have stopped and then surfaced to
//! the caller, producer errors first.
//!
//! # Example
//!
//! ```
//! use pipeline::Broker;
//!
//! let mut next = 0u32;
//! let mut seen = Vec::new();
//! Broker::new(3)
//!     .run(
//!         || {
//!             next += 1;
//!             Ok::<_, ()>(if next <= 10 { Some(next) } else { None })
//!         },
//!         |item| {
//!             seen.push(item);
//!             Ok(())
//!         },
//!     )
//!     .unwrap();
//! assert_eq!(seen.len(), 10);
//! ```

pub mod broker;
pub mod queue;
pub mod sync;

pub use broker::{Broker, LeaderRole};
pub use queue::{HandoffQueue, PushError};
pub use sync::Semaphore;
