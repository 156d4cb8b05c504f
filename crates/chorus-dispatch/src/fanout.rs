//! Asynchronous fan-out/fan-in composition.
//!
//! Firing submits one task per handler to the injected
//! [`TaskScheduler`], then one join task that waits on each handler's
//! result in registration order and folds them with the reducer. The
//! fire returns immediately with an [`Eventual`] for the combined
//! result.
//!
//! Registration is lock-free and only weakly consistent with in-flight
//! fires: a handler removed concurrently with a fire may or may not be
//! included in that fire, but never causes a fault.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::trace;

use chorus_core::{DirectScheduler, EventError, Eventual, Key, TaskScheduler};

use crate::reduce::Reducer;
use crate::registry::{ConcurrentEntries, HandlerEntry};

/// Handler shape for fan-out events: borrow the payload, produce a
/// result on whatever thread the scheduler chose.
pub type FanoutHandler<P, R> = dyn Fn(&P) -> R + Send + Sync + 'static;

/// Fully asynchronous event: handlers run as scheduled tasks and the
/// fire yields an [`Eventual`] for the reduced result.
///
/// A handler that panics fails its own task; the join surfaces the first
/// such failure (in registration order) when the eventual is observed,
/// without preventing sibling tasks from running to completion. Nothing
/// is retried and nothing can be cancelled once fired.
pub struct FanoutEvent<P, R> {
    entries: Arc<ConcurrentEntries<FanoutHandler<P, R>>>,
    reducer: Reducer<R>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl<P: Send + Sync + 'static, R: Send + 'static> FanoutEvent<P, R> {
    /// Create an event that fans out on `scheduler` and folds results
    /// with `reducer`.
    pub fn new(
        reducer: impl Fn(R, R) -> R + Send + Sync + 'static,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        Self {
            entries: Arc::new(ConcurrentEntries::new()),
            reducer: Arc::new(reducer),
            scheduler,
        }
    }

    /// Create an event scheduled directly on the firing thread: every
    /// fire completes before returning.
    pub fn direct(reducer: impl Fn(R, R) -> R + Send + Sync + 'static) -> Self {
        Self::new(reducer, Arc::new(DirectScheduler))
    }

    /// Create an event where handlers that respond earlier take
    /// precedence: the fold keeps the first result. All handlers still
    /// run.
    pub fn first_takes_precedence(scheduler: Arc<dyn TaskScheduler>) -> Self {
        Self::new(|first, _| first, scheduler)
    }

    /// Register `handler` under a freshly minted key, which is returned.
    /// Safe to call from any thread, including concurrently with fires.
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

    /// Remove every entry registered under `key`. Weakly consistent: an
    /// in-flight fire may still include the handler.
    pub fn unregister(&self, key: Key) {
        self.entries.remove(key);
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// The invoker handle. It reads the registration state current at
    /// each fire, with the same weak consistency as the event itself.
    pub fn invoker(&self) -> FanoutInvoker<P, R> {
        FanoutInvoker {
            entries: self.entries.clone(),
            reducer: self.reducer.clone(),
            scheduler: self.scheduler.clone(),
        }
    }

    /// Fan `payload` out to every registered handler; returns an
    /// [`Eventual`] that settles with the reduced result (`None` with
    /// zero handlers) once every handler task and the join complete.
    pub fn fire(&self, payload: P) -> Eventual<Option<R>> {
        dispatch(
            &self.entries.snapshot(),
            &self.reducer,
            self.scheduler.as_ref(),
            payload,
        )
    }
}

/// Callable handle for a [`FanoutEvent`].
pub struct FanoutInvoker<P, R> {
    entries: Arc<ConcurrentEntries<FanoutHandler<P, R>>>,
    reducer: Reducer<R>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl<P: Send + Sync + 'static, R: Send + 'static> FanoutInvoker<P, R> {
    /// Fan `payload` out to every registered handler; see
    /// [`FanoutEvent::fire`].
    pub fn fire(&self, payload: P) -> Eventual<Option<R>> {
        dispatch(
            &self.entries.snapshot(),
            &self.reducer,
            self.scheduler.as_ref(),
            payload,
        )
    }
}

impl<P, R> Clone for FanoutInvoker<P, R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            reducer: self.reducer.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

fn dispatch<P: Send + Sync + 'static, R: Send + 'static>(
    entries: &[HandlerEntry<FanoutHandler<P, R>>],
    reducer: &Reducer<R>,
    scheduler: &dyn TaskScheduler,
    payload: P,
) -> Eventual<Option<R>> {
    trace!(handlers = entries.len(), "firing asynchronous event");
    let payload = Arc::new(payload);
    let mut pending = Vec::with_capacity(entries.len());

    for entry in entries {
        let (writer, eventual) = Eventual::new();
        let handler = entry.handler.clone();
        let payload = payload.clone();
        scheduler.submit(Box::new(move || {
            match catch_unwind(AssertUnwindSafe(|| handler(payload.as_ref()))) {
                Ok(value) => writer.resolve(value),
                Err(panic) => writer.fail(EventError::HandlerFailed(panic_message(&panic))),
            }
        }));
        pending.push(eventual);
    }

    // The join task blocks on each handler's result in registration
    // order, so the fold order matches the synchronous reduce strategy
    // regardless of completion order.
    let (writer, joined) = Eventual::new();
    let reducer = reducer.clone();
    scheduler.submit(Box::new(move || {
        let mut result: Option<R> = None;
        for eventual in pending {
            match eventual.wait() {
                Ok(value) => {
                    result = Some(match result {
                        Some(acc) => reducer(acc, value),
                        None => value,
                    });
                }
                Err(error) => {
                    writer.fail(error);
                    return;
                }
            }
        }
        writer.resolve(result);
    }));

    joined
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}
