//! Per-worker task manager.
//!
//! Holds at most one current task and drives it every pulse. When the task
//! finishes part-way through a pulse the leftover time goes to a freshly
//! selected task, up to `scheduler.max_tasks_per_pulse` starts per pulse.
//! A task that fails is force-ended and the worker idles for the rest of
//! the pulse; the failure never reaches other workers.

use std::collections::VecDeque;

use marsbase_logic::clock::MarsTime;
use marsbase_logic::constants::scheduler::{ACTIVITY_LOG_CAPACITY, TIME_EPSILON};
use serde::{Deserialize, Serialize};

use crate::selection::{JobBoard, SelectionEngine};
use crate::task::{Task, TaskContext, TaskPhase};

/// One entry of a worker's activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneActivity {
    pub start: MarsTime,
    pub task_name: String,
    pub phase: Option<TaskPhase>,
}

/// Bounded history, oldest entries dropped first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: VecDeque<OneActivity>,
    capacity: usize,
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, activity: OneActivity) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(activity);
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OneActivity> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&OneActivity> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAPACITY)
    }
}

/// What happened to a worker during one pulse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PulseOutcome {
    /// Tasks started this pulse.
    pub started: u32,
    /// Millisols of the pulse spent idle.
    pub idle_time: f64,
    pub failure: Option<TaskFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub task: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskManager {
    task: Option<Task>,
    log: ActivityLog,
}

impl TaskManager {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            task: None,
            log: ActivityLog::with_capacity(log_capacity),
        }
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn task_name(&self) -> Option<&str> {
        self.task.as_ref().map(|t| t.name())
    }

    pub fn phase(&self) -> Option<TaskPhase> {
        self.task.as_ref().and_then(|t| t.phase())
    }

    pub fn is_idle(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_done())
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Activities started on the given sol.
    pub fn activities_on(&self, sol: u32) -> Vec<&OneActivity> {
        self.log.iter().filter(|a| a.start.sol() == sol).collect()
    }

    pub fn today(&self, now: MarsTime) -> Vec<&OneActivity> {
        self.activities_on(now.sol())
    }

    /// End the current task now, releasing anything it holds.
    pub fn cancel(&mut self, ctx: &mut TaskContext) {
        if let Some(mut task) = self.task.take() {
            task.end_task(ctx);
        }
    }

    /// Run one pulse for the worker.
    pub fn perform_pulse(
        &mut self,
        ctx: &mut TaskContext,
        selector: &SelectionEngine,
        board: &mut JobBoard,
    ) -> PulseOutcome {
        let mut outcome = PulseOutcome::default();
        let max_starts = ctx.config.scheduler.max_tasks_per_pulse;
        let start = ctx.pulse.start_time();
        let elapsed = ctx.pulse.elapsed;
        let mut remaining = elapsed;

        while remaining > TIME_EPSILON {
            if self.is_idle() {
                self.cancel(ctx);
                if outcome.started >= max_starts {
                    break;
                }
                // Every attempt counts, so repeated refusals can't spin.
                outcome.started += 1;
                match selector.select(ctx, board) {
                    Some(task) if !task.is_done() => {
                        self.record(&task, start.add(elapsed - remaining));
                        self.task = Some(task);
                    }
                    Some(task) => {
                        log::debug!("{} ended on creation: {}", task.name(), task.description());
                        continue;
                    }
                    None => break,
                }
            }

            let Some(task) = self.task.as_mut() else {
                break;
            };
            let phase_before = task.phase();
            match task.perform_mapped_phase(remaining, ctx) {
                Ok(left) => {
                    let left = left.clamp(0.0, remaining);
                    let progressed = remaining - left > TIME_EPSILON;
                    remaining = left;
                    if !task.is_done() && task.phase() != phase_before {
                        let activity = OneActivity {
                            start: start.add(elapsed - remaining),
                            task_name: task.name().to_string(),
                            phase: task.phase(),
                        };
                        self.log.record(activity);
                    }
                    if !progressed || !self.is_idle() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Task '{}' force-ended: {}", task.name(), e);
                    outcome.failure = Some(TaskFailure {
                        task: task.name().to_string(),
                        error: e.to_string(),
                    });
                    task.end_task(ctx);
                    break;
                }
            }
        }

        // At most one live task per worker between pulses.
        if self.is_idle() {
            self.cancel(ctx);
            outcome.idle_time = remaining;
        }
        outcome
    }

    fn record(&mut self, task: &Task, start: MarsTime) {
        self.log.record(OneActivity {
            start,
            task_name: task.name().to_string(),
            phase: task.phase(),
        });
    }
}
