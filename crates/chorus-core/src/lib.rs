//! # Chorus Core — foundation for typed event dispatch
//!
//! This crate provides the capability types the dispatch engine in
//! `chorus-dispatch` is built on:
//!
//! - [`Key`]: opaque identity tokens naming registrations
//! - [`EventError`]: the dispatch error taxonomy
//! - [`Executor`]: the minimal run-a-task capability, with the shared
//!   [`direct()`] default that runs tasks inline
//! - [`TaskScheduler`]: the submit-for-later capability used by
//!   asynchronous fan-out, with a direct default and a tokio adapter
//! - [`Eventual`]: an explicit future/promise (pending → resolved |
//!   failed) with blocking and async consumption
//!
//! Nothing here dispatches events by itself; these are the seams the
//! engine delegates to, so embedding applications can substitute their
//! own scheduling without touching dispatch logic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Dispatch error taxonomy.
pub mod error;

/// Explicit future/promise for asynchronous dispatch results.
pub mod eventual;

/// The run-a-task capability and its direct default.
pub mod executor;

/// Opaque identity keys for registered handlers.
pub mod key;

/// The task-scheduling capability for asynchronous fan-out.
pub mod scheduler;

pub use error::EventError;
pub use eventual::{Eventual, EventualWriter};
pub use executor::{direct, DirectExecutor, Executor, Task};
pub use key::Key;
pub use scheduler::{DirectScheduler, TaskScheduler, TokioScheduler};
