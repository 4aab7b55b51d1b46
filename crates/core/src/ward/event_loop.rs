//! Virtual clock and timer queue.
//!
//! Tasks run in `(due_at, order)` order. A task is either tracked, meaning
//! `settle` waits for it, or untracked, meaning it only runs once the clock
//! is advanced past its due time.

use tracing::trace;

use crate::error::{HarnessError, HarnessResult};

pub const DEFAULT_STEP_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Task<T> {
    pub due_at: u64,
    pub order: u64,
    pub tracked: bool,
    pub effect: T,
}

#[derive(Debug)]
pub struct EventLoop<T> {
    now_ms: u64,
    next_order: u64,
    queue: Vec<Task<T>>,
    step_limit: usize,
    steps: usize,
}

impl<T> Default for EventLoop<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventLoop<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_order: 0,
            queue: Vec::new(),
            step_limit: DEFAULT_STEP_LIMIT,
            steps: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn set_step_limit(&mut self, max_steps: usize) -> HarnessResult<()> {
        if max_steps == 0 {
            return Err(HarnessError::Config(
                "task step limit must be at least 1".to_string(),
            ));
        }
        self.step_limit = max_steps;
        Ok(())
    }

    pub fn schedule(&mut self, delay_ms: u64, tracked: bool, effect: T) {
        let task = Task {
            due_at: self.now_ms.saturating_add(delay_ms),
            order: self.next_order,
            tracked,
            effect,
        };
        self.next_order += 1;
        self.queue.push(task);
    }

    /// Drop pending tasks whose effect matches. Returns how many were dropped.
    pub fn cancel<F>(&mut self, mut matches: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.queue.len();
        self.queue.retain(|task| !matches(&task.effect));
        before - self.queue.len()
    }

    /// Drop every pending task but keep the clock.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Reset the per-run step counter. Called at the start of each
    /// `settle`/`advance`.
    pub fn begin_run(&mut self) {
        self.steps = 0;
    }

    /// Next task `settle` should run: everything ordered before the last
    /// pending tracked task. `None` once no tracked task remains.
    pub fn next_for_settle(&mut self) -> HarnessResult<Option<Task<T>>> {
        let Some(limit) = self
            .queue
            .iter()
            .filter(|task| task.tracked)
            .map(|task| (task.due_at, task.order))
            .max()
        else {
            return Ok(None);
        };
        self.take_next(|task| (task.due_at, task.order) <= limit)
    }

    /// Next task due at or before `target_ms`.
    pub fn next_due(&mut self, target_ms: u64) -> HarnessResult<Option<Task<T>>> {
        self.take_next(|task| task.due_at <= target_ms)
    }

    /// Move the clock forward to `target_ms` once every due task has run.
    pub fn finish_advance(&mut self, target_ms: u64) {
        if target_ms > self.now_ms {
            self.now_ms = target_ms;
        }
    }

    fn take_next<F>(&mut self, eligible: F) -> HarnessResult<Option<Task<T>>>
    where
        F: Fn(&Task<T>) -> bool,
    {
        let Some(index) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, task)| eligible(task))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(index, _)| index)
        else {
            return Ok(None);
        };

        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(HarnessError::Driver(format!(
                "task queue exceeded {} steps (now_ms={}, pending={})",
                self.step_limit,
                self.now_ms,
                self.queue.len()
            )));
        }

        let task = self.queue.remove(index);
        if task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        trace!(due_at = task.due_at, order = task.order, tracked = task.tracked, "run task");
        Ok(Some(task))
    }
}
