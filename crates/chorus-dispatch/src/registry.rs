//! Registry cores: ordered handler entries under three locking
//! disciplines.
//!
//! Every composition strategy wraps one of these collections. They share
//! the same contract — insertion order is dispatch order, duplicate keys
//! are legal, removal matches every entry with the key — and differ only
//! in how mutation and dispatch may interleave:
//!
//! - [`ConfinedEntries`]: a live list plus the creating `ThreadId`;
//!   every operation fails fast off-thread. Dispatch walks the live list
//!   index-by-index, re-locking per step, so a handler may legally
//!   mutate the registry mid-fire.
//! - [`SharedEntries`]: mutations serialize on a mutex and republish an
//!   immutable snapshot; dispatch loads the snapshot without locking.
//! - [`ConcurrentEntries`]: lock-free read-copy-update list for the
//!   asynchronous regime; weakly consistent with in-flight fires.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use chorus_core::{EventError, Executor, Key};

/// One registered handler with its identity key and optional dispatch
/// executor.
pub(crate) struct HandlerEntry<H: ?Sized> {
    pub(crate) handler: Arc<H>,
    pub(crate) key: Key,
    pub(crate) executor: Option<Arc<dyn Executor>>,
}

impl<H: ?Sized> HandlerEntry<H> {
    pub(crate) fn new(handler: Arc<H>, key: Key, executor: Option<Arc<dyn Executor>>) -> Self {
        Self {
            handler,
            key,
            executor,
        }
    }
}

impl<H: ?Sized> Clone for HandlerEntry<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            key: self.key,
            executor: self.executor.clone(),
        }
    }
}

/// Live entry list confined to its creating thread.
pub(crate) struct ConfinedEntries<H: ?Sized> {
    entries: Mutex<Vec<HandlerEntry<H>>>,
    created_on: ThreadId,
}

impl<H: ?Sized> ConfinedEntries<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            created_on: thread::current().id(),
        }
    }

    /// Hard precondition check: confined registries may only be touched
    /// from the thread that created them.
    pub(crate) fn check_thread(&self) -> Result<(), EventError> {
        let caller = thread::current().id();
        if caller == self.created_on {
            Ok(())
        } else {
            Err(EventError::WrongThread {
                created: self.created_on,
                caller,
            })
        }
    }

    pub(crate) fn push(&self, entry: HandlerEntry<H>) -> Result<(), EventError> {
        self.check_thread()?;
        trace!(key = %entry.key, "registering handler");
        self.entries.lock().push(entry);
        Ok(())
    }

    pub(crate) fn remove(&self, key: Key) -> Result<(), EventError> {
        self.check_thread()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        if entries.len() != before {
            debug!(%key, removed = before - entries.len(), "unregistered handlers");
        }
        Ok(())
    }

    pub(crate) fn clear(&self) -> Result<(), EventError> {
        self.check_thread()?;
        self.entries.lock().clear();
        Ok(())
    }

    /// Clone out the entry at `index` from the live list.
    ///
    /// Callers have already passed [`check_thread`](Self::check_thread);
    /// the lock is held only for the lookup, so a handler running between
    /// steps may register or unregister and the change is visible to the
    /// remainder of the walk.
    pub(crate) fn entry_at(&self, index: usize) -> Option<HandlerEntry<H>> {
        self.entries.lock().get(index).cloned()
    }
}

/// Mutation-locked entry list publishing an immutable snapshot.
pub(crate) struct SharedEntries<H: ?Sized> {
    entries: Mutex<Vec<HandlerEntry<H>>>,
    baked: ArcSwap<Vec<HandlerEntry<H>>>,
}

impl<H: ?Sized> SharedEntries<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            baked: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub(crate) fn push(&self, entry: HandlerEntry<H>) {
        trace!(key = %entry.key, "registering handler");
        let mut entries = self.entries.lock();
        entries.push(entry);
        self.baked.store(Arc::new(entries.clone()));
    }

    pub(crate) fn remove(&self, key: Key) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        if entries.len() != before {
            debug!(%key, removed = before - entries.len(), "unregistered handlers");
            self.baked.store(Arc::new(entries.clone()));
        }
    }

    pub(crate) fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.baked.store(Arc::new(Vec::new()));
    }

    /// The immutable snapshot current at this instant. Never mutated
    /// once published; safe to iterate without locking.
    pub(crate) fn snapshot(&self) -> Arc<Vec<HandlerEntry<H>>> {
        self.baked.load_full()
    }
}

/// Lock-free entry list for the asynchronous regime.
pub(crate) struct ConcurrentEntries<H: ?Sized> {
    entries: ArcSwap<Vec<HandlerEntry<H>>>,
}

impl<H: ?Sized> ConcurrentEntries<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub(crate) fn push(&self, entry: HandlerEntry<H>) {
        trace!(key = %entry.key, "registering handler");
        self.entries.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(entry.clone());
            next
        });
    }

    pub(crate) fn remove(&self, key: Key) {
        self.entries.rcu(|current| {
            current
                .iter()
                .filter(|entry| entry.key != key)
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    pub(crate) fn clear(&self) {
        self.entries.store(Arc::new(Vec::new()));
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<HandlerEntry<H>>> {
        self.entries.load_full()
    }
}
