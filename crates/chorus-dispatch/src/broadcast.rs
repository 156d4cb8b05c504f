//! Broadcast composition: call every handler in order, ignore results.
//!
//! Entries registered with an executor are submitted to it; everything
//! else runs inline. A panic from an inline handler is not caught, so it
//! unwinds out of the fire and the remaining handlers of that pass do
//! not run — observed behavior of this dispatch family, kept as the
//! documented contract rather than silently changed.

use std::sync::Arc;

use chorus_core::{EventError, Executor, Key};

use crate::registry::{ConfinedEntries, HandlerEntry, SharedEntries};

/// Handler shape for broadcast events: borrow the payload, return
/// nothing. Use `P = ()` for payload-free signals and a tuple payload
/// for multi-argument events.
pub type BroadcastHandler<P> = dyn Fn(&P) + Send + Sync + 'static;

fn run_entry<P: Send + Sync + 'static>(
    handler: &Arc<BroadcastHandler<P>>,
    executor: Option<&Arc<dyn Executor>>,
    payload: &Arc<P>,
) {
    match executor {
        Some(executor) => {
            let handler = handler.clone();
            let payload = payload.clone();
            executor.execute(Box::new(move || handler(payload.as_ref())));
        }
        None => handler(payload.as_ref()),
    }
}

/// Broadcast event confined to its creating thread.
///
/// Registration, unregistration, and firing must all happen on the
/// thread that created the event; any other thread gets
/// [`EventError::WrongThread`]. In exchange, dispatch always reflects
/// the live registration state — a handler that registers another
/// handler mid-fire may see it visited in the same pass.
///
/// Handlers may be registered with a per-entry [`Executor`] via
/// [`register_via`](Self::register_via); their dispatch is submitted to
/// that executor instead of running inline.
pub struct ConfinedBroadcast<P> {
    entries: Arc<ConfinedEntries<BroadcastHandler<P>>>,
}

impl<P: Send + Sync + 'static> ConfinedBroadcast<P> {
    /// Create an empty broadcast event owned by the current thread.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(ConfinedEntries::new()),
        }
    }

    /// Register `handler` under a freshly minted key, which is returned.
    pub fn register(
        &self,
        handler: impl Fn(&P) + Send + Sync + 'static,
    ) -> Result<Key, EventError> {
        let key = Key::new();
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None))?;
        Ok(key)
    }

    /// Register `handler` under a caller-supplied key. Duplicate keys are
    /// legal; every entry dispatches.
    pub fn register_keyed(
        &self,
        handler: impl Fn(&P) + Send + Sync + 'static,
        key: Key,
    ) -> Result<(), EventError> {
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None))
    }

    /// Register `handler` so its dispatch is submitted to `executor`.
    pub fn register_via(
        &self,
        handler: impl Fn(&P) + Send + Sync + 'static,
        key: Key,
        executor: Arc<dyn Executor>,
    ) -> Result<(), EventError> {
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, Some(executor)))
    }

    /// Remove every entry registered under `key`; silent no-op when none
    /// match.
    pub fn unregister(&self, key: Key) -> Result<(), EventError> {
        self.entries.remove(key)
    }

    /// Remove all entries.
    pub fn clear(&self) -> Result<(), EventError> {
        self.entries.clear()
    }

    /// The invoker handle. It closes over the live entry list, so it
    /// reflects the latest registration state at every call.
    pub fn invoker(&self) -> ConfinedBroadcastInvoker<P> {
        ConfinedBroadcastInvoker {
            entries: self.entries.clone(),
        }
    }

    /// Dispatch `payload` to every registered handler in registration
    /// order.
    pub fn fire(&self, payload: P) -> Result<(), EventError> {
        self.invoker().fire(payload)
    }
}

impl<P: Send + Sync + 'static> Default for ConfinedBroadcast<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Callable handle for a [`ConfinedBroadcast`] event.
pub struct ConfinedBroadcastInvoker<P> {
    entries: Arc<ConfinedEntries<BroadcastHandler<P>>>,
}

impl<P: Send + Sync + 'static> ConfinedBroadcastInvoker<P> {
    /// Dispatch `payload` to every registered handler in registration
    /// order.
    pub fn fire(&self, payload: P) -> Result<(), EventError> {
        self.entries.check_thread()?;
        let payload = Arc::new(payload);
        let mut index = 0;
        while let Some(entry) = self.entries.entry_at(index) {
            run_entry(&entry.handler, entry.executor.as_ref(), &payload);
            index += 1;
        }
        Ok(())
    }
}

impl<P> Clone for ConfinedBroadcastInvoker<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// Thread-safe broadcast event.
///
/// Mutations lock; dispatch reads an immutable snapshot published at the
/// most recent mutation, so a firing in progress is never affected by
/// concurrent registration changes, and concurrent firings never block
/// each other.
pub struct SharedBroadcast<P> {
    entries: Arc<SharedEntries<BroadcastHandler<P>>>,
    executor: Option<Arc<dyn Executor>>,
}

impl<P: Send + Sync + 'static> SharedBroadcast<P> {
    /// Create an empty thread-safe broadcast event; handlers run inline
    /// on the firing thread.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(SharedEntries::new()),
            executor: None,
        }
    }

    /// Create a thread-safe broadcast event that submits every handler
    /// call to `executor`, which may run them concurrently with each
    /// other and with the firing call's return.
    pub fn pooled(executor: Arc<dyn Executor>) -> Self {
        Self {
            entries: Arc::new(SharedEntries::new()),
            executor: Some(executor),
        }
    }

    /// Register `handler` under a freshly minted key, which is returned.
    pub fn register(&self, handler: impl Fn(&P) + Send + Sync + 'static) -> Key {
        let key = Key::new();
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None));
        key
    }

    /// Register `handler` under a caller-supplied key. Duplicate keys are
    /// legal; every entry dispatches.
    pub fn register_keyed(&self, handler: impl Fn(&P) + Send + Sync + 'static, key: Key) {
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None));
    }

    /// Remove every entry registered under `key`; silent no-op when none
    /// match.
    pub fn unregister(&self, key: Key) {
        self.entries.remove(key);
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// The invoker handle over the snapshot current right now. It does
    /// not observe later registrations; re-fetch after mutating.
    pub fn invoker(&self) -> SharedBroadcastInvoker<P> {
        SharedBroadcastInvoker {
            snapshot: self.entries.snapshot(),
            executor: self.executor.clone(),
        }
    }

    /// Dispatch `payload` through the freshest snapshot.
    pub fn fire(&self, payload: P) {
        fire_snapshot(&self.entries.snapshot(), self.executor.as_ref(), payload);
    }
}

impl<P: Send + Sync + 'static> Default for SharedBroadcast<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Callable handle for a [`SharedBroadcast`] event, over the snapshot
/// captured when it was fetched.
pub struct SharedBroadcastInvoker<P> {
    snapshot: Arc<Vec<HandlerEntry<BroadcastHandler<P>>>>,
    executor: Option<Arc<dyn Executor>>,
}

impl<P: Send + Sync + 'static> SharedBroadcastInvoker<P> {
    /// Dispatch `payload` to every handler in the captured snapshot.
    pub fn fire(&self, payload: P) {
        fire_snapshot(&self.snapshot, self.executor.as_ref(), payload);
    }
}

impl<P> Clone for SharedBroadcastInvoker<P> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            executor: self.executor.clone(),
        }
    }
}

fn fire_snapshot<P: Send + Sync + 'static>(
    entries: &[HandlerEntry<BroadcastHandler<P>>],
    executor: Option<&Arc<dyn Executor>>,
    payload: P,
) {
    let payload = Arc::new(payload);
    for entry in entries {
        run_entry(&entry.handler, entry.executor.as_ref().or(executor), &payload);
    }
}
