//! The task-scheduling capability for asynchronous fan-out.

use tracing::trace;

use crate::executor::Task;

/// Capability to submit tasks for eventual execution.
///
/// Submitted tasks carry their own completion plumbing (they settle an
/// [`Eventual`](crate::Eventual) themselves); schedulers only decide
/// where and when the task body runs. Implementations must preserve no
/// particular completion order — fan-in code orders results itself.
pub trait TaskScheduler: Send + Sync {
    /// Enqueue `task`. May run it before returning (direct scheduling) or
    /// concurrently on another thread (pooled scheduling).
    fn submit(&self, task: Task);
}

/// Runs each submitted task immediately on the submitting thread.
///
/// A batch submitted through this scheduler runs fully sequentially, so
/// an asynchronous fire completes before the call returns, and the first
/// task failure settles the join as failed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectScheduler;

impl TaskScheduler for DirectScheduler {
    fn submit(&self, task: Task) {
        task();
    }
}

/// Submits tasks to the blocking pool of an externally owned tokio
/// runtime.
///
/// The core never creates threads of its own; the runtime behind the
/// handle is the embedding application's to size and shut down.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Schedule on the given runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Schedule on the runtime of the calling context.
    ///
    /// Like [`tokio::runtime::Handle::current`], this panics when called
    /// outside a tokio runtime.
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl TaskScheduler for TokioScheduler {
    fn submit(&self, task: Task) {
        trace!("submitting dispatch task to blocking pool");
        self.handle.spawn_blocking(task);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn direct_scheduler_runs_submissions_in_order() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let scheduler = DirectScheduler;
        for i in 0..3 {
            let log = log.clone();
            scheduler.submit(Box::new(move || log.lock().push(i)));
        }
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_scheduler_runs_submitted_tasks() {
        let scheduler = TokioScheduler::current();
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let task_count = count.clone();
        scheduler.submit(Box::new(move || {
            task_count.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        }));

        rx.await.expect("task should signal completion");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
