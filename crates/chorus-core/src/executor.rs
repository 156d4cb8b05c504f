//! The run-a-task capability that handler dispatch delegates to.

use std::sync::Arc;

use once_cell::sync::Lazy;

/// A unit of work handed to an [`Executor`] or
/// [`TaskScheduler`](crate::TaskScheduler).
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run a task.
///
/// Direct implementations complete the task before `execute` returns.
/// Pooled implementations hand it to an externally owned scheduling
/// facility and may run it on another thread, concurrently with other
/// dispatched tasks and with the caller's return.
pub trait Executor: Send + Sync {
    /// Run or enqueue `task`.
    fn execute(&self, task: Task);
}

/// Runs every task inline on the calling thread, before returning.
///
/// This is the default for all non-pooled dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectExecutor;

impl Executor for DirectExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

static DIRECT: Lazy<Arc<DirectExecutor>> = Lazy::new(|| Arc::new(DirectExecutor));

/// The shared direct executor.
///
/// Stateless and freely shareable; cloning the `Arc` is the entire cost
/// of handing it to a registration.
pub fn direct() -> Arc<dyn Executor> {
    DIRECT.clone()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn direct_executor_runs_inline() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        DirectExecutor.execute(Box::new(move || flag.store(true, Ordering::SeqCst)));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn shared_direct_executor_is_reusable() {
        let executor = direct();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        executor.execute(Box::new(move || flag.store(true, Ordering::SeqCst)));
        assert!(ran.load(Ordering::SeqCst));
    }
}
