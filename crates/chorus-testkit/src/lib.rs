//! Test instrumentation for chorus event dispatch.
//!
//! Small, deterministic stand-ins for the capabilities the engine
//! delegates to: an ordered observation log for asserting dispatch
//! order, a manually pumped scheduler for stepping asynchronous fires,
//! and a counting executor for asserting executor delegation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use chorus_core::{Executor, Task, TaskScheduler};

/// Ordered, thread-safe observation log.
///
/// Handlers push into a clone of the log; the test asserts against
/// [`RecordingLog::snapshot`].
pub struct RecordingLog<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> RecordingLog<T> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append an observation.
    pub fn push(&self, value: T) {
        self.entries.lock().push(value);
    }

    /// The observations so far, in push order.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    /// Number of observations so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T: Clone> Default for RecordingLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// Scheduler that queues submitted tasks until the test pumps them.
///
/// Tasks run on the pumping thread, in submission order, so a test can
/// interleave assertions between a fire and its task execution.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<Task>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run queued tasks until the queue drains, returning how many ran.
    /// Tasks submitted while pumping run in the same pass.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.queue.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn submit(&self, task: Task) {
        self.queue.lock().push_back(task);
    }
}

/// Executor that runs tasks inline and counts them.
#[derive(Default)]
pub struct CountingExecutor {
    executed: AtomicUsize,
}

impl CountingExecutor {
    /// Create an executor with a zero count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks executed so far.
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl Executor for CountingExecutor {
    fn execute(&self, task: Task) {
        self.executed.fetch_add(1, Ordering::SeqCst);
        task();
    }
}
