//! Tasks: resumable, phased units of worker behaviour.
//!
//! A [`Task`] is re-entered every pulse with a millisol budget through
//! [`Task::perform_mapped_phase`]. The active [`TaskPhase`] selects which
//! step of the task's [`TaskKind`] runs; a step consumes part of the budget
//! and reports a [`StepOutcome`]: keep going, move to another phase, or
//! finish. Leftover time is handed back so the task manager can chain into a
//! replacement task within the same pulse.
//!
//! Lifecycle: constructed (possibly already done when a precondition fails),
//! stepped across pulses, then ended exactly once through [`Task::end_task`],
//! which runs the kind's `clear_down` to release any station slot.

mod charge;
mod eat;
mod maintain;
mod manage_heat;
mod relax;
mod research;
mod sleep;
mod walk;

pub use charge::{ChargeMeta, ChargeTask};
pub use eat::{EatMeta, EatTask};
pub use maintain::{MaintainTask, MaintenanceMeta};
pub use manage_heat::{ManageHeatMeta, ManageHeatTask};
pub use relax::{RelaxMeta, RelaxTask};
pub use research::{ResearchMeta, ResearchTask};
pub use sleep::{SleepMeta, SleepTask};
pub use walk::WalkTask;

use hecs::{Entity, World};
use marsbase_logic::clock::ClockPulse;
use marsbase_logic::constants::scheduler::TIME_EPSILON;
use serde::{Deserialize, Serialize};

use crate::components::{BuildingId, Location};
use crate::config::SimConfig;
use crate::directory::Directory;
use crate::facilities::Occupancy;
use crate::settlement::SettlementStatus;
use crate::SimRng;

/// Phase identifier with a human-readable description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    Walking,
    Charging,
    Sleeping,
    PickingUpFood,
    Eating,
    Relaxing,
    Researching,
    Maintaining,
    AdjustingHeaters,
}

impl TaskPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TaskPhase::Walking => "walking",
            TaskPhase::Charging => "charging",
            TaskPhase::Sleeping => "sleeping",
            TaskPhase::PickingUpFood => "picking up food",
            TaskPhase::Eating => "eating",
            TaskPhase::Relaxing => "relaxing",
            TaskPhase::Researching => "researching",
            TaskPhase::Maintaining => "maintaining",
            TaskPhase::AdjustingHeaters => "adjusting heaters",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TaskPhase::Walking => "Walking to the destination building",
            TaskPhase::Charging => "Recharging at a robotic station",
            TaskPhase::Sleeping => "Sleeping",
            TaskPhase::PickingUpFood => "Collecting a meal at the canteen counter",
            TaskPhase::Eating => "Having a meal",
            TaskPhase::Relaxing => "Taking a break",
            TaskPhase::Researching => "Working at a lab bench",
            TaskPhase::Maintaining => "Servicing building equipment",
            TaskPhase::AdjustingHeaters => "Boosting electric heaters",
        }
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one phase step. Every variant carries the unused time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Continue { leftover: f64 },
    Transition { next: TaskPhase, leftover: f64 },
    Finished { leftover: f64 },
}

impl StepOutcome {
    pub fn leftover(&self) -> f64 {
        match self {
            StepOutcome::Continue { leftover }
            | StepOutcome::Transition { leftover, .. }
            | StepOutcome::Finished { leftover } => *leftover,
        }
    }
}

/// Everything a task step may read or mutate during one pulse.
pub struct TaskContext<'a> {
    pub world: &'a World,
    pub directory: &'a Directory,
    pub worker: Entity,
    pub pulse: &'a ClockPulse,
    pub status: &'a SettlementStatus,
    pub config: &'a SimConfig,
    pub occupancy: &'a Occupancy,
    pub rng: &'a mut SimRng,
}

impl TaskContext<'_> {
    pub fn building_entity(&self, id: BuildingId) -> Result<Entity, TaskError> {
        self.directory
            .building(id)
            .ok_or(TaskError::UnknownBuilding(id))
    }

    pub fn worker_location(&self) -> Option<BuildingId> {
        self.world
            .get::<&Location>(self.worker)
            .ok()
            .and_then(|loc| loc.building)
    }
}

#[derive(Debug)]
pub enum TaskError {
    /// A task reached a state its phase logic can't handle, e.g. no active
    /// phase while not done.
    InvalidState { task: String, detail: String },
    MissingComponent(hecs::ComponentError),
    UnknownBuilding(BuildingId),
}

impl TaskError {
    pub(crate) fn unexpected_phase(task: &str, phase: TaskPhase) -> Self {
        TaskError::InvalidState {
            task: task.to_string(),
            detail: format!("unexpected phase '{}'", phase),
        }
    }
}

impl From<hecs::ComponentError> for TaskError {
    fn from(e: hecs::ComponentError) -> Self {
        TaskError::MissingComponent(e)
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskError::InvalidState { task, detail } => {
                write!(f, "Task '{}' in invalid state: {}", task, detail)
            }
            TaskError::MissingComponent(e) => write!(f, "Missing component: {}", e),
            TaskError::UnknownBuilding(id) => write!(f, "Unknown building {}", id),
        }
    }
}

impl std::error::Error for TaskError {}

/// Concrete behaviour of a task. Each variant owns its per-task state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskKind {
    Walk(WalkTask),
    Charge(ChargeTask),
    Sleep(SleepTask),
    Eat(EatTask),
    Relax(RelaxTask),
    Research(ResearchTask),
    Maintain(MaintainTask),
    ManageHeat(ManageHeatTask),
}

impl TaskKind {
    fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        match self {
            TaskKind::Walk(t) => t.step(phase, time, ctx),
            TaskKind::Charge(t) => t.step(phase, time, ctx),
            TaskKind::Sleep(t) => t.step(phase, time, ctx),
            TaskKind::Eat(t) => t.step(phase, time, ctx),
            TaskKind::Relax(t) => t.step(phase, time, ctx),
            TaskKind::Research(t) => t.step(phase, time, ctx),
            TaskKind::Maintain(t) => t.step(phase, time, ctx),
            TaskKind::ManageHeat(t) => t.step(phase, time, ctx),
        }
    }

    fn clear_down(&mut self, ctx: &mut TaskContext) {
        match self {
            TaskKind::Charge(t) => t.clear_down(ctx),
            TaskKind::Sleep(t) => t.clear_down(ctx),
            TaskKind::Eat(t) => t.clear_down(ctx),
            TaskKind::Research(t) => t.clear_down(ctx),
            TaskKind::Maintain(t) => t.clear_down(ctx),
            TaskKind::Walk(_) | TaskKind::Relax(_) | TaskKind::ManageHeat(_) => {}
        }
    }
}

/// Safety valve on phase transitions inside a single call.
const MAX_STEPS_PER_CALL: u32 = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    name: String,
    description: String,
    phase: Option<TaskPhase>,
    /// Time budget in millisols; 0 means open-ended.
    duration: f64,
    time_completed: f64,
    done: bool,
    cleared: bool,
    subtask: Option<Box<Task>>,
    kind: TaskKind,
}

impl Task {
    pub(crate) fn new(
        name: &str,
        description: impl Into<String>,
        phase: TaskPhase,
        duration: f64,
        kind: TaskKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.into(),
            phase: Some(phase),
            duration: duration.max(0.0),
            time_completed: 0.0,
            done: false,
            cleared: false,
            subtask: None,
            kind,
        }
    }

    /// A task whose preconditions failed on construction. It is already done
    /// and has nothing to clear down.
    pub(crate) fn ended(name: &str, description: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.into(),
            phase: None,
            duration: 0.0,
            time_completed: 0.0,
            done: true,
            cleared: true,
            subtask: None,
            kind,
        }
    }

    /// Walk to `destination` first if the worker is somewhere else.
    pub(crate) fn walk_to(&mut self, ctx: &TaskContext, destination: BuildingId) {
        if self.done || ctx.worker_location() == Some(destination) {
            return;
        }
        let walk = WalkTask::create(destination, ctx.config.scheduler.walk_time);
        self.subtask = Some(Box::new(walk));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Phase of the innermost running task, so a worker walking on behalf of
    /// a task reports "walking".
    pub fn phase(&self) -> Option<TaskPhase> {
        match &self.subtask {
            Some(sub) if !sub.is_done() => sub.phase(),
            _ => self.phase,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn time_completed(&self) -> f64 {
        self.time_completed
    }

    pub fn subtask(&self) -> Option<&Task> {
        self.subtask.as_deref()
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn set_phase(&mut self, phase: TaskPhase) {
        if !self.done {
            self.phase = Some(phase);
        }
    }

    /// Drive the task with `time` millisols. Returns the unused time.
    pub fn perform_mapped_phase(
        &mut self,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<f64, TaskError> {
        if self.done {
            return Ok(time);
        }
        let mut remaining = time.max(0.0);

        if let Some(sub) = self.subtask.as_mut() {
            if !sub.is_done() {
                remaining = sub.perform_mapped_phase(remaining, ctx)?;
            }
            if !sub.is_done() {
                return Ok(remaining);
            }
            self.subtask = None;
        }

        let mut steps = 0;
        while remaining > TIME_EPSILON && !self.done && steps < MAX_STEPS_PER_CALL {
            steps += 1;
            let Some(phase) = self.phase else {
                return Err(TaskError::InvalidState {
                    task: self.name.clone(),
                    detail: "no active phase".into(),
                });
            };

            let budget = if self.duration > 0.0 {
                remaining.min(self.duration - self.time_completed).max(0.0)
            } else {
                remaining
            };

            let outcome = self.kind.step(phase, budget, ctx)?;
            let used = budget - outcome.leftover().clamp(0.0, budget);
            self.time_completed += used;
            remaining -= used;

            match outcome {
                StepOutcome::Continue { .. } => {}
                StepOutcome::Transition { next, .. } => self.set_phase(next),
                StepOutcome::Finished { .. } => self.end_task(ctx),
            }

            if !self.done
                && self.duration > 0.0
                && self.time_completed >= self.duration - TIME_EPSILON
            {
                self.end_task(ctx);
            }

            if !self.done && used <= TIME_EPSILON && matches!(outcome, StepOutcome::Continue { .. })
            {
                // No progress; try again next pulse.
                break;
            }
        }

        Ok(remaining)
    }

    /// End the task. Idempotent; clear-down runs only on the first call.
    pub fn end_task(&mut self, ctx: &mut TaskContext) {
        self.done = true;
        if self.cleared {
            return;
        }
        self.cleared = true;
        if let Some(sub) = self.subtask.as_mut() {
            sub.end_task(ctx);
        }
        self.kind.clear_down(ctx);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use crate::components::{BuildingKind, JobType, RoboticStation, Station};
    use crate::facilities::{station_of, FacilityKind};

    #[test]
    fn task_without_phase_is_invalid() {
        let mut fx = Fixture::new();
        let robot = fx.robot(50.0, None);
        let mut task = Task::new(
            "Broken",
            "no phase",
            TaskPhase::Relaxing,
            10.0,
            TaskKind::Relax(RelaxTask::new(None)),
        );
        task.phase = None;
        let mut ctx = fx.ctx(robot);
        let err = task.perform_mapped_phase(5.0, &mut ctx).unwrap_err();
        assert!(matches!(err, TaskError::InvalidState { .. }));
    }

    #[test]
    fn end_task_is_idempotent() {
        let mut fx = Fixture::new();
        let garage = fx.building(
            BuildingKind::Garage,
            (RoboticStation {
                slots: Station::new(2),
            },),
        );
        let robot = fx.robot(40.0, Some(garage));

        // Another robot already holds one slot.
        assert!(crate::facilities::acquire(
            &fx.world,
            &fx.directory,
            garage,
            FacilityKind::ChargingSlot
        ));

        let mut ctx = fx.ctx(robot);
        let mut task = ChargeTask::create(&mut ctx, Some(garage));
        assert!(!task.is_done());
        task.end_task(&mut ctx);
        task.end_task(&mut ctx);
        assert!(task.is_done());

        let station = station_of(&fx.world, &fx.directory, garage, FacilityKind::ChargingSlot);
        assert_eq!(station.unwrap().occupied(), 1, "slot released exactly once");
    }

    #[test]
    fn done_task_returns_all_time() {
        let mut fx = Fixture::new();
        let robot = fx.robot(50.0, None);
        let mut task = Task::ended("Nothing", "", TaskKind::Relax(RelaxTask::new(None)));
        let mut ctx = fx.ctx(robot);
        assert_eq!(task.perform_mapped_phase(3.0, &mut ctx).unwrap(), 3.0);
    }

    #[test]
    fn duration_ends_task_and_returns_leftover() {
        let mut fx = Fixture::new();
        let person = fx.person(JobType::Chef, None);
        let mut ctx = fx.ctx(person);
        let mut task = Task::new(
            "Relax",
            "",
            TaskPhase::Relaxing,
            10.0,
            TaskKind::Relax(RelaxTask::new(None)),
        );
        let leftover = task.perform_mapped_phase(25.0, &mut ctx).unwrap();
        assert!(task.is_done());
        assert!((leftover - 15.0).abs() < 1e-9);
        assert!((task.time_completed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn walking_subtask_runs_first() {
        let mut fx = Fixture::new();
        let garage = fx.building(
            BuildingKind::Garage,
            (RoboticStation {
                slots: Station::new(1),
            },),
        );
        let robot = fx.robot(40.0, None);
        let mut ctx = fx.ctx(robot);
        let mut task = ChargeTask::create(&mut ctx, Some(garage));
        assert_eq!(task.phase(), Some(TaskPhase::Walking));

        // Walk time is 5 millisols by default.
        task.perform_mapped_phase(3.0, &mut ctx).unwrap();
        assert_eq!(task.phase(), Some(TaskPhase::Walking));
        task.perform_mapped_phase(3.0, &mut ctx).unwrap();
        assert_eq!(task.phase(), Some(TaskPhase::Charging));
        assert_eq!(ctx.worker_location(), Some(garage));
    }
}
