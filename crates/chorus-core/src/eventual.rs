//! An explicit future/promise: pending → resolved-with-value | failed.
//!
//! [`Eventual`] is the handle an asynchronous fire returns. It supports
//! blocking consumption ([`Eventual::wait`]), polling consumption
//! ([`Eventual::try_take`]), completion-state queries
//! ([`Eventual::is_settled`]), and `await` via its
//! [`std::future::Future`] implementation. The paired
//! [`EventualWriter`] settles it exactly once; a writer dropped without
//! settling fails the eventual with [`EventError::Abandoned`] so a
//! dropped dispatch never strands a waiter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::{Condvar, Mutex};

use crate::error::EventError;

enum State<T> {
    Pending,
    Resolved(T),
    Failed(EventError),
    Taken,
}

struct Cell<T> {
    state: Mutex<State<T>>,
    settled: Condvar,
    wakers: Mutex<Vec<Waker>>,
}

impl<T> Cell<T> {
    /// First settle wins; later settles are ignored.
    fn settle(&self, next: State<T>) {
        {
            let mut state = self.state.lock();
            if matches!(*state, State::Pending) {
                *state = next;
            }
        }
        self.settled.notify_all();
        for waker in self.wakers.lock().drain(..) {
            waker.wake();
        }
    }
}

/// Write half of an [`Eventual`]; settles it exactly once.
pub struct EventualWriter<T> {
    cell: Option<Arc<Cell<T>>>,
}

impl<T> EventualWriter<T> {
    /// Settle the paired eventual with a value.
    pub fn resolve(mut self, value: T) {
        if let Some(cell) = self.cell.take() {
            cell.settle(State::Resolved(value));
        }
    }

    /// Settle the paired eventual as failed.
    pub fn fail(mut self, error: EventError) {
        if let Some(cell) = self.cell.take() {
            cell.settle(State::Failed(error));
        }
    }
}

impl<T> Drop for EventualWriter<T> {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            cell.settle(State::Failed(EventError::Abandoned));
        }
    }
}

/// A value that becomes available once a dispatch completes.
///
/// The value can be taken once; after it has been taken, further
/// attempts report [`EventError::Abandoned`].
pub struct Eventual<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Eventual<T> {
    /// Create an unsettled eventual and the writer that settles it.
    pub fn new() -> (EventualWriter<T>, Eventual<T>) {
        let cell = Arc::new(Cell {
            state: Mutex::new(State::Pending),
            settled: Condvar::new(),
            wakers: Mutex::new(Vec::new()),
        });
        (
            EventualWriter {
                cell: Some(cell.clone()),
            },
            Eventual { cell },
        )
    }

    /// An eventual that is already resolved with `value`.
    pub fn resolved(value: T) -> Eventual<T> {
        let (writer, eventual) = Eventual::new();
        writer.resolve(value);
        eventual
    }

    /// An eventual that is already failed with `error`.
    pub fn failed(error: EventError) -> Eventual<T> {
        let (writer, eventual) = Eventual::new();
        writer.fail(error);
        eventual
    }

    /// Completion-state query: true once resolved or failed.
    pub fn is_settled(&self) -> bool {
        !matches!(*self.cell.state.lock(), State::Pending)
    }

    /// Block the calling thread until the eventual settles, then take
    /// the result.
    pub fn wait(self) -> Result<T, EventError> {
        let mut state = self.cell.state.lock();
        while matches!(*state, State::Pending) {
            self.cell.settled.wait(&mut state);
        }
        take_settled(&mut state)
    }

    /// Take the result without blocking; `None` while still pending.
    pub fn try_take(&mut self) -> Option<Result<T, EventError>> {
        let mut state = self.cell.state.lock();
        if matches!(*state, State::Pending) {
            return None;
        }
        Some(take_settled(&mut state))
    }
}

fn take_settled<T>(state: &mut State<T>) -> Result<T, EventError> {
    match std::mem::replace(state, State::Taken) {
        State::Resolved(value) => Ok(value),
        State::Failed(error) => Err(error),
        State::Pending | State::Taken => Err(EventError::Abandoned),
    }
}

impl<T> Future for Eventual<T> {
    type Output = Result<T, EventError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = this.cell.state.lock();
        if matches!(*state, State::Pending) {
            this.cell.wakers.lock().push(cx.waker().clone());
            return Poll::Pending;
        }
        Poll::Ready(take_settled(&mut state))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn resolve_then_wait() {
        let (writer, eventual) = Eventual::new();
        writer.resolve(7);
        assert!(eventual.is_settled());
        assert_eq!(eventual.wait(), Ok(7));
    }

    #[test]
    fn fail_then_wait() {
        let (writer, eventual) = Eventual::<u32>::new();
        writer.fail(EventError::HandlerFailed("boom".into()));
        assert_eq!(
            eventual.wait(),
            Err(EventError::HandlerFailed("boom".into()))
        );
    }

    #[test]
    fn try_take_reports_pending_then_value() {
        let (writer, mut eventual) = Eventual::new();
        assert!(eventual.try_take().is_none());
        writer.resolve("done");
        assert_eq!(eventual.try_take(), Some(Ok("done")));
        // A taken eventual no longer yields the value.
        assert_eq!(eventual.try_take(), Some(Err(EventError::Abandoned)));
    }

    #[test]
    fn dropped_writer_fails_the_eventual() {
        let (writer, eventual) = Eventual::<u32>::new();
        drop(writer);
        assert_eq!(eventual.wait(), Err(EventError::Abandoned));
    }

    #[test]
    fn wait_blocks_until_settled_from_another_thread() {
        let (writer, eventual) = Eventual::new();
        let settle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.resolve(42);
        });
        assert_eq!(eventual.wait(), Ok(42));
        settle.join().expect("settling thread should not panic");
    }

    #[test]
    fn awaiting_an_eventual_yields_the_result() {
        let (writer, eventual) = Eventual::new();
        let waiter = thread::spawn(move || futures::executor::block_on(eventual));
        thread::sleep(Duration::from_millis(20));
        writer.resolve(9);
        assert_eq!(waiter.join().expect("waiter should not panic"), Ok(9));
    }
}
