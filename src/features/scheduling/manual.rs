//! Deterministic scheduler driven by its owner
//!
//! Async tasks queue until `run_pending`; repeating tasks fire on `tick`.
//! Useful for tests and for hosts that already own a game-style loop.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::scheduler::{Repeat, RepeatingTask, Task, TaskScheduler};

#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<Task>>,
    repeating: Mutex<Vec<(Duration, RepeatingTask)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of async tasks waiting to run
    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Run queued async tasks, including ones queued while running
    ///
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        // lock is released before each task so tasks may schedule more work
        while let Some(task) = self.pop() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run only the oldest queued async task
    pub fn run_next(&self) -> bool {
        match self.pop() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Fire every repeating task once, dropping those that stop
    pub fn tick(&self) {
        let mut tasks = match self.repeating.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };
        tasks.retain_mut(|(_, task)| task() == Repeat::Continue);
        if let Ok(mut guard) = self.repeating.lock() {
            // keep tasks registered during the tick
            tasks.append(&mut *guard);
            *guard = tasks;
        }
    }

    pub fn repeating_count(&self) -> usize {
        self.repeating.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn pop(&self) -> Option<Task> {
        self.queue.lock().ok()?.pop_front()
    }
}

impl TaskScheduler for ManualScheduler {
    fn run_now(&self, task: Task) {
        task();
    }

    fn run_async(&self, task: Task) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(task);
        }
    }

    fn run_repeating(&self, period: Duration, task: RepeatingTask) {
        if let Ok(mut repeating) = self.repeating.lock() {
            repeating.push((period, task));
        }
    }
}
