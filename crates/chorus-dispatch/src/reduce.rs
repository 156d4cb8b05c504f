//! Reduce composition: call every handler with the same payload, fold
//! the results left-to-right with a caller-supplied reducer.
//!
//! The first handler's result seeds the fold; each later result is
//! combined with `reducer(acc, next)`. Zero handlers produce `None`.
//! Boolean votes layer a policy on top: `FavorFalse` reconciles with
//! AND, `FavorTrue` with OR, and a zero-handler vote is `false`.

use std::sync::Arc;

use chorus_core::{EventError, Key};

use crate::registry::{ConfinedEntries, HandlerEntry, SharedEntries};

/// Handler shape for reduce events: borrow the payload, produce a
/// result.
pub type ReduceHandler<P, R> = dyn Fn(&P) -> R + Send + Sync + 'static;

/// Shared binary reducer folding handler results into one value.
pub type Reducer<R> = Arc<dyn Fn(R, R) -> R + Send + Sync + 'static>;

/// How a boolean vote reconciles disagreeing handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePolicy {
    /// Reconcile with AND: any dissenting `false` wins.
    FavorFalse,
    /// Reconcile with OR: any assenting `true` wins.
    FavorTrue,
}

impl VotePolicy {
    fn reducer(self) -> Reducer<bool> {
        match self {
            VotePolicy::FavorFalse => Arc::new(|a, b| a && b),
            VotePolicy::FavorTrue => Arc::new(|a, b| a || b),
        }
    }
}

/// Reduce event confined to its creating thread; dispatch reads the
/// live registration state at call time.
pub struct ConfinedReduce<P, R> {
    entries: Arc<ConfinedEntries<ReduceHandler<P, R>>>,
    reducer: Reducer<R>,
}

impl<P: 'static, R: 'static> ConfinedReduce<P, R> {
    /// Create an empty reduce event folding results with `reducer`.
    pub fn with_reducer(reducer: impl Fn(R, R) -> R + Send + Sync + 'static) -> Self {
        Self {
            entries: Arc::new(ConfinedEntries::new()),
            reducer: Arc::new(reducer),
        }
    }

    /// Create a reduce event where later registrations override earlier
    /// ones: the fold keeps the newest result.
    pub fn last_wins() -> Self {
        Self::with_reducer(|_, newest| newest)
    }

    /// Register `handler` under a freshly minted key, which is returned.
    pub fn register(
        &self,
        handler: impl Fn(&P) -> R + Send + Sync + 'static,
    ) -> Result<Key, EventError> {
        let key = Key::new();
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None))?;
        Ok(key)
    }

    /// Register `handler` under a caller-supplied key.
    pub fn register_keyed(
        &self,
        handler: impl Fn(&P) -> R + Send + Sync + 'static,
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
    pub fn invoker(&self) -> ConfinedReduceInvoker<P, R> {
        ConfinedReduceInvoker {
            entries: self.entries.clone(),
            reducer: self.reducer.clone(),
        }
    }

    /// Call every handler with `payload` and fold the results; `None`
    /// with zero handlers.
    pub fn fire(&self, payload: &P) -> Result<Option<R>, EventError> {
        self.invoker().fire(payload)
    }
}

impl<P: 'static> ConfinedReduce<P, bool> {
    /// Create a boolean vote event under `policy`.
    pub fn vote(policy: VotePolicy) -> Self {
        Self {
            entries: Arc::new(ConfinedEntries::new()),
            reducer: policy.reducer(),
        }
    }

    /// Fire a boolean vote; zero handlers vote `false`.
    pub fn fire_vote(&self, payload: &P) -> Result<bool, EventError> {
        Ok(self.fire(payload)?.unwrap_or(false))
    }
}

/// Callable handle for a [`ConfinedReduce`] event.
pub struct ConfinedReduceInvoker<P, R> {
    entries: Arc<ConfinedEntries<ReduceHandler<P, R>>>,
    reducer: Reducer<R>,
}

impl<P: 'static, R: 'static> ConfinedReduceInvoker<P, R> {
    /// Call every handler with `payload` and fold the results; `None`
    /// with zero handlers.
    pub fn fire(&self, payload: &P) -> Result<Option<R>, EventError> {
        self.entries.check_thread()?;
        let mut result: Option<R> = None;
        let mut index = 0;
        while let Some(entry) = self.entries.entry_at(index) {
            let current = (entry.handler)(payload);
            result = Some(match result {
                Some(acc) => (self.reducer)(acc, current),
                None => current,
            });
            index += 1;
        }
        Ok(result)
    }
}

impl<P, R> Clone for ConfinedReduceInvoker<P, R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            reducer: self.reducer.clone(),
        }
    }
}

/// Thread-safe reduce event; dispatch reads the immutable snapshot
/// published at the most recent mutation.
pub struct SharedReduce<P, R> {
    entries: Arc<SharedEntries<ReduceHandler<P, R>>>,
    reducer: Reducer<R>,
}

impl<P: 'static, R: 'static> SharedReduce<P, R> {
    /// Create an empty thread-safe reduce event folding results with
    /// `reducer`.
    pub fn with_reducer(reducer: impl Fn(R, R) -> R + Send + Sync + 'static) -> Self {
        Self {
            entries: Arc::new(SharedEntries::new()),
            reducer: Arc::new(reducer),
        }
    }

    /// Create a reduce event where later registrations override earlier
    /// ones: the fold keeps the newest result.
    pub fn last_wins() -> Self {
        Self::with_reducer(|_, newest| newest)
    }

    /// Register `handler` under a freshly minted key, which is returned.
    pub fn register(&self, handler: impl Fn(&P) -> R + Send + Sync + 'static) -> Key {
        let key = Key::new();
        self.entries
            .push(HandlerEntry::new(Arc::new(handler), key, None));
        key
    }

    /// Register `handler` under a caller-supplied key.
    pub fn register_keyed(&self, handler: impl Fn(&P) -> R + Send + Sync + 'static, key: Key) {
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
    pub fn invoker(&self) -> SharedReduceInvoker<P, R> {
        SharedReduceInvoker {
            snapshot: self.entries.snapshot(),
            reducer: self.reducer.clone(),
        }
    }

    /// Call every handler with `payload` through the freshest snapshot
    /// and fold the results; `None` with zero handlers.
    pub fn fire(&self, payload: &P) -> Option<R> {
        fire_snapshot(&self.entries.snapshot(), &self.reducer, payload)
    }
}

impl<P: 'static> SharedReduce<P, bool> {
    /// Create a thread-safe boolean vote event under `policy`.
    pub fn vote(policy: VotePolicy) -> Self {
        Self {
            entries: Arc::new(SharedEntries::new()),
            reducer: policy.reducer(),
        }
    }

    /// Fire a boolean vote; zero handlers vote `false`.
    pub fn fire_vote(&self, payload: &P) -> bool {
        self.fire(payload).unwrap_or(false)
    }
}

/// Callable handle for a [`SharedReduce`] event, over the snapshot
/// captured when it was fetched.
pub struct SharedReduceInvoker<P, R> {
    snapshot: Arc<Vec<HandlerEntry<ReduceHandler<P, R>>>>,
    reducer: Reducer<R>,
}

impl<P: 'static, R: 'static> SharedReduceInvoker<P, R> {
    /// Call every handler with `payload` through the captured snapshot
    /// and fold the results; `None` with zero handlers.
    pub fn fire(&self, payload: &P) -> Option<R> {
        fire_snapshot(&self.snapshot, &self.reducer, payload)
    }
}

impl<P: 'static> SharedReduceInvoker<P, bool> {
    /// Fire a boolean vote; zero handlers vote `false`.
    pub fn fire_vote(&self, payload: &P) -> bool {
        self.fire(payload).unwrap_or(false)
    }
}

impl<P, R> Clone for SharedReduceInvoker<P, R> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            reducer: self.reducer.clone(),
        }
    }
}

fn fire_snapshot<P, R>(
    entries: &[HandlerEntry<ReduceHandler<P, R>>],
    reducer: &Reducer<R>,
    payload: &P,
) -> Option<R> {
    let mut result: Option<R> = None;
    for entry in entries {
        let current = (entry.handler)(payload);
        result = Some(match result {
            Some(acc) => reducer(acc, current),
            None => current,
        });
    }
    result
}
