//! Dispatch error taxonomy.

use std::thread::ThreadId;

use thiserror::Error;

/// Errors surfaced by registries, invokers, and [`Eventual`] handles.
///
/// Handler panics during synchronous dispatch are deliberately absent:
/// the engine does not catch them, so they unwind out of the invoker
/// call. Only asynchronous task boundaries convert a panic into
/// [`EventError::HandlerFailed`].
///
/// [`Eventual`]: crate::Eventual
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A confined registry was touched from a thread other than the one
    /// that created it. This is a programming error, surfaced
    /// synchronously at the call site; it is never recovered from.
    #[error("operation confined to the registry's creating thread (created on {created:?}, called from {caller:?})")]
    WrongThread {
        /// Thread the registry was created on.
        created: ThreadId,
        /// Thread the offending call arrived from.
        caller: ThreadId,
    },

    /// A handler task panicked during asynchronous dispatch. The payload
    /// is the panic message, when one could be extracted.
    #[error("event handler failed: {0}")]
    HandlerFailed(String),

    /// The dispatch backing an [`Eventual`] was dropped before settling
    /// it, or the eventual's value was already taken.
    ///
    /// [`Eventual`]: crate::Eventual
    #[error("event dispatch was abandoned before a result was produced")]
    Abandoned,
}
