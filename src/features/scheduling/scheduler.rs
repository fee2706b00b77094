//! # Task Scheduler
//!
//! The two execution contexts a dispatch can land on, plus periodic tasks.
//! `run_now` is the primary context: the task runs before the call returns.
//! `run_async` hands the task to a background worker.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Skip the immediate first interval tick so periods are exact
//! - 1.0.0: Initial tokio-backed scheduler

use anyhow::Result;
use log::debug;
use std::time::Duration;
use tokio::runtime::Handle;

/// One-shot unit of work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Periodic unit of work, called once per period until it returns `Stop`
pub type RepeatingTask = Box<dyn FnMut() -> Repeat + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Continue,
    Stop,
}

/// Scheduling effects the dispatcher consumes from its host
pub trait TaskScheduler: Send + Sync {
    /// Run on the primary context
    fn run_now(&self, task: Task);

    /// Run on a background worker, later
    fn run_async(&self, task: Task);

    /// Run `task` every `period`, first call one period from now
    fn run_repeating(&self, period: Duration, task: RepeatingTask);
}

/// Scheduler backed by a tokio runtime
///
/// Async tasks go to the blocking pool because handlers are plain closures
/// that may block.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime the caller is running inside
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("TokioScheduler needs a running tokio runtime: {e}"))?;
        Ok(Self::new(handle))
    }
}

impl TaskScheduler for TokioScheduler {
    fn run_now(&self, task: Task) {
        task();
    }

    fn run_async(&self, task: Task) {
        self.handle.spawn_blocking(task);
    }

    fn run_repeating(&self, period: Duration, mut task: RepeatingTask) {
        self.handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if task() == Repeat::Stop {
                    debug!("Repeating task stopped after returning Stop");
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_run_now_is_inline() {
        let scheduler = TokioScheduler::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        scheduler.run_now(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_async_runs_on_worker() {
        let scheduler = TokioScheduler::current().unwrap();
        let (tx, rx) = oneshot::channel();
        let caller = std::thread::current().id();
        scheduler.run_async(Box::new(move || {
            let _ = tx.send(std::thread::current().id());
        }));
        let worker = rx.await.unwrap();
        assert_ne!(worker, caller);
    }

    #[tokio::test]
    async fn test_run_repeating_stops() {
        let scheduler = TokioScheduler::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        scheduler.run_repeating(
            Duration::from_millis(5),
            Box::new(move || {
                if c.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                    Repeat::Stop
                } else {
                    Repeat::Continue
                }
            }),
        );

        sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_current_without_runtime_is_error() {
        assert!(TokioScheduler::current().is_err());
    }
}
