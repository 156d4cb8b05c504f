//! Chain composition: thread a value through every handler in order.
//!
//! Each handler receives the result of the previous one and returns a
//! replacement; the fire returns the final result. With zero handlers
//! the input passes through unchanged. Handlers also receive a borrowed
//! context `C` that is never replaced — use `C = ()` (the default) for
//! the plain unary shape.

use std::sync::Arc;

use chorus_core::{EventError, Key};

use crate::registry::{ConfinedEntries, HandlerEntry, SharedEntries};

/// Handler shape for chain events: consume the value so far, borrow the
/// context, return the new value.
pub type ChainHandler<T, C> = dyn Fn(T, &C) -> T + Send + Sync + 'static;

/// Chain event confined to its creating thread; dispatch reads the live
/// registration state at call time.
pub struct ConfinedChain<T, C = ()> {
    entries: Arc<ConfinedEntries<ChainHandler<T, C>>>,
}

impl<T: 'static, C: 'static> ConfinedChain<T, C> {
    /// Create an empty chain event owned by the current thread.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(ConfinedEntries::new()),
        }
    }

    /// Register `handler` under a freshly minted key, which is returned.
    pub fn register(
        &self,
        handler: impl Fn(T, &C) -> T + Send + Sync + 'static,
    ) -> Result<Key, EventError> {
        let key = Key::new();
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None))?;
        Ok(key)
    }

    /// Register `handler` under a caller-supplied key.
    pub fn register_keyed(
        &self,
        handler: impl Fn(T, &C) -> T + Send + Sync + 'static,
        key: Key,
    ) -> Result<(), EventError> {
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None))
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

    /// The invoker handle over the live entry list.
    pub fn invoker(&self) -> ConfinedChainInvoker<T, C> {
        ConfinedChainInvoker {
            entries: self.entries.clone(),
        }
    }

    /// Thread `value` through every handler in registration order.
    pub fn fire_with(&self, value: T, ctx: &C) -> Result<T, EventError> {
        self.invoker().fire_with(value, ctx)
    }
}

impl<T: 'static> ConfinedChain<T> {
    /// Unary shape: thread `value` through every handler.
    pub fn fire(&self, value: T) -> Result<T, EventError> {
        self.fire_with(value, &())
    }
}

impl<T: 'static, C: 'static> Default for ConfinedChain<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Callable handle for a [`ConfinedChain`] event.
pub struct ConfinedChainInvoker<T, C = ()> {
    entries: Arc<ConfinedEntries<ChainHandler<T, C>>>,
}

impl<T: 'static, C: 'static> ConfinedChainInvoker<T, C> {
    /// Thread `value` through every handler in registration order.
    pub fn fire_with(&self, mut value: T, ctx: &C) -> Result<T, EventError> {
        self.entries.check_thread()?;
        let mut index = 0;
        while let Some(entry) = self.entries.entry_at(index) {
            value = (entry.handler)(value, ctx);
            index += 1;
        }
        Ok(value)
    }
}

impl<T: 'static> ConfinedChainInvoker<T> {
    /// Unary shape: thread `value` through every handler.
    pub fn fire(&self, value: T) -> Result<T, EventError> {
        self.fire_with(value, &())
    }
}

impl<T, C> Clone for ConfinedChainInvoker<T, C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// Thread-safe chain event; dispatch reads the immutable snapshot
/// published at the most recent mutation.
pub struct SharedChain<T, C = ()> {
    entries: Arc<SharedEntries<ChainHandler<T, C>>>,
}

impl<T: 'static, C: 'static> SharedChain<T, C> {
    /// Create an empty thread-safe chain event.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(SharedEntries::new()),
        }
    }

    /// Register `handler` under a freshly minted key, which is returned.
    pub fn register(&self, handler: impl Fn(T, &C) -> T + Send + Sync + 'static) -> Key {
        let key = Key::new();
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None));
        key
    }

    /// Register `handler` under a caller-supplied key.
    pub fn register_keyed(&self, handler: impl Fn(T, &C) -> T + Send + Sync + 'static, key: Key) {
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
    pub fn invoker(&self) -> SharedChainInvoker<T, C> {
        SharedChainInvoker {
            snapshot: self.entries.snapshot(),
        }
    }

    /// Thread `value` through the freshest snapshot.
    pub fn fire_with(&self, value: T, ctx: &C) -> T {
        fire_snapshot(&self.entries.snapshot(), value, ctx)
    }
}

impl<T: 'static> SharedChain<T> {
    /// Unary shape: thread `value` through every handler.
    pub fn fire(&self, value: T) -> T {
        self.fire_with(value, &())
    }
}

impl<T: 'static, C: 'static> Default for SharedChain<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Callable handle for a [`SharedChain`] event, over the snapshot
/// captured when it was fetched.
pub struct SharedChainInvoker<T, C = ()> {
    snapshot: Arc<Vec<HandlerEntry<ChainHandler<T, C>>>>,
}

impl<T: 'static, C: 'static> SharedChainInvoker<T, C> {
    /// Thread `value` through the captured snapshot.
    pub fn fire_with(&self, value: T, ctx: &C) -> T {
        fire_snapshot(&self.snapshot, value, ctx)
    }
}

impl<T: 'static> SharedChainInvoker<T> {
    /// Unary shape: thread `value` through every handler.
    pub fn fire(&self, value: T) -> T {
        self.fire_with(value, &())
    }
}

impl<T, C> Clone for SharedChainInvoker<T, C> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
        }
    }
}

fn fire_snapshot<T, C>(entries: &[HandlerEntry<ChainHandler<T, C>>], mut value: T, ctx: &C) -> T {
    for entry in entries {
        value = (entry.handler)(value, ctx);
    }
    value
}
