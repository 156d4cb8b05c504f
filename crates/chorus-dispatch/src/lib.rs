//! # Chorus Dispatch — typed event/delegate registries
//!
//! A publisher owns an event value, registers callback handlers against
//! it, and fires it; dispatch visits every registered handler in
//! registration order and combines their outcomes according to the
//! event's composition strategy:
//!
//! - [`broadcast`]: call all, ignore results
//! - [`chain`]: thread a value through each handler, each sees the
//!   prior result
//! - [`reduce`]: call all with the same payload, fold results with a
//!   reducer (including boolean votes)
//! - [`fanout`]: dispatch each handler as a scheduled task, fold results
//!   once all complete, yield an [`Eventual`]
//!
//! Each strategy comes in the concurrency regimes it supports: confined
//! (`Confined*`, single-thread, live registration state), thread-safe
//! (`Shared*`, mutation-locked with lock-free snapshot dispatch), and
//! fully asynchronous ([`fanout::FanoutEvent`], lock-free registration,
//! scheduled execution).
//!
//! ```
//! use chorus_dispatch::reduce::SharedReduce;
//!
//! let highest_bid = SharedReduce::<u32, u32>::with_reducer(u32::max);
//! highest_bid.register(|_item: &u32| 3);
//! highest_bid.register(|_item: &u32| 7);
//! assert_eq!(highest_bid.fire(&1), Some(7));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Call-all composition, with optional executor-delegated dispatch.
pub mod broadcast;

/// Progressive-transform composition.
pub mod chain;

/// Asynchronous fan-out/fan-in composition.
pub mod fanout;

/// Fold-results composition, including boolean votes.
pub mod reduce;

mod registry;

pub use broadcast::{ConfinedBroadcast, SharedBroadcast};
pub use chain::{ConfinedChain, SharedChain};
pub use fanout::FanoutEvent;
pub use reduce::{ConfinedReduce, SharedReduce, VotePolicy};

// Re-export the foundation types callers need to hold.
pub use chorus_core::{
    direct, DirectExecutor, DirectScheduler, EventError, Eventual, Executor, Key, TaskScheduler,
    TokioScheduler,
};
