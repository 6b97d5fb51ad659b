//! Meta tasks: factories that score candidate tasks for a worker.
//!
//! A [`MetaTask`] never runs anything itself. Every pulse it is asked, for an
//! idle worker, which concrete tasks make sense and how much the worker wants
//! each one. Worker-scoped metas answer per worker; settlement-scoped metas
//! post jobs to the [`crate::selection::JobBoard`] once per pulse, and each
//! candidate worker re-scores those jobs for itself.
//!
//! The registry is built explicitly from the config before any worker exists.

use hecs::{Entity, World};
use marsbase_logic::clock::MarsTime;

use crate::components::{
    performance_rating, Battery, BuildingId, Job, JobType, Location, PhysicalCondition, RobotType,
    Skills, Worker, WorkerId, WorkerKind,
};
use crate::config::SimConfig;
use crate::directory::Directory;
use crate::facilities::Occupancy;
use crate::settlement::SettlementStatus;
use crate::task::{
    ChargeMeta, ChargeTask, EatMeta, EatTask, MaintainTask, MaintenanceMeta, ManageHeatMeta,
    ManageHeatTask, RelaxMeta, RelaxTask, ResearchMeta, ResearchTask, SleepMeta, SleepTask, Task,
    TaskContext,
};
use crate::SimRng;

/// Names of every built-in meta task, in registration order.
pub const BUILTIN_META_TASKS: &[&str] = &[
    "charge",
    "sleep",
    "eat",
    "relax",
    "research",
    "manage_heat",
    "maintenance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaTaskScope {
    /// Scored per worker.
    Worker,
    /// Posts jobs to the job board once per pulse.
    Settlement,
}

/// Read-only view of the world used while scoring.
pub struct MetaContext<'a> {
    pub world: &'a World,
    pub directory: &'a Directory,
    pub status: &'a SettlementStatus,
    pub config: &'a SimConfig,
    /// Building occupancy at the start of the pulse.
    pub occupancy: &'a Occupancy,
    pub now: MarsTime,
}

impl<'a> MetaContext<'a> {
    pub fn new(
        world: &'a World,
        directory: &'a Directory,
        status: &'a SettlementStatus,
        config: &'a SimConfig,
        occupancy: &'a Occupancy,
        now: MarsTime,
    ) -> Self {
        Self {
            world,
            directory,
            status,
            config,
            occupancy,
            now,
        }
    }
}

/// Snapshot of the worker attributes scoring looks at.
#[derive(Debug, Clone)]
pub struct WorkerView {
    pub entity: Entity,
    pub id: WorkerId,
    pub kind: WorkerKind,
    pub job: Option<JobType>,
    pub skills: Skills,
    pub location: Option<BuildingId>,
    pub condition: Option<PhysicalCondition>,
    /// Battery level for robots.
    pub battery: Option<f32>,
    pub performance: f32,
}

impl WorkerView {
    pub fn read(world: &World, entity: Entity) -> Result<Self, hecs::ComponentError> {
        let worker = world.get::<&Worker>(entity)?;
        let condition = world.get::<&PhysicalCondition>(entity).ok().map(|c| *c);
        let battery = world.get::<&Battery>(entity).ok().map(|b| *b);
        Ok(Self {
            entity,
            id: worker.id,
            kind: worker.kind,
            job: world.get::<&Job>(entity).ok().map(|j| j.0),
            skills: world.get::<&Skills>(entity).map(|s| *s).unwrap_or_default(),
            location: world.get::<&Location>(entity).ok().and_then(|l| l.building),
            condition,
            battery: battery.map(|b| b.level),
            performance: performance_rating(condition.as_ref(), battery.as_ref()),
        })
    }

    pub fn is_person(&self) -> bool {
        matches!(self.kind, WorkerKind::Person)
    }

    pub fn robot_type(&self) -> Option<RobotType> {
        match self.kind {
            WorkerKind::Robot(t) => Some(t),
            WorkerKind::Person => None,
        }
    }

    /// Engineers, technicians and repair robots take on building upkeep.
    pub fn is_mechanic(&self) -> bool {
        match self.kind {
            WorkerKind::Person => self.job.is_some_and(|j| j.is_mechanical()),
            WorkerKind::Robot(t) => t == RobotType::Repairbot,
        }
    }

    /// Mechanics skill, with repair robots counted as fully trained.
    pub fn mechanics(&self) -> f32 {
        match self.kind {
            WorkerKind::Robot(RobotType::Repairbot) => self.skills.mechanics.max(0.75),
            _ => self.skills.mechanics,
        }
    }
}

/// A scored candidate. `kind` knows how to build the task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskJob {
    pub meta: &'static str,
    pub score: f32,
    pub kind: JobKind,
}

/// Factory for a concrete task, with the target it was scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Charge { station: BuildingId },
    Sleep { bed: Option<BuildingId> },
    Eat { seat: BuildingId },
    Relax { building: Option<BuildingId> },
    Research { lab: BuildingId },
    Maintain { building: BuildingId },
    ManageHeat { building: BuildingId },
}

impl JobKind {
    /// Build the task. It may come back already done if the target was taken
    /// in the meantime.
    pub fn create(&self, ctx: &mut TaskContext) -> Task {
        match *self {
            JobKind::Charge { station } => ChargeTask::create(ctx, Some(station)),
            JobKind::Sleep { bed } => SleepTask::create(ctx, bed),
            JobKind::Eat { seat } => EatTask::create(ctx, seat),
            JobKind::Relax { building } => RelaxTask::create(ctx, building),
            JobKind::Research { lab } => ResearchTask::create(ctx, lab),
            JobKind::Maintain { building } => MaintainTask::create(ctx, building),
            JobKind::ManageHeat { building } => ManageHeatTask::create(ctx, building),
        }
    }

    pub fn target(&self) -> Option<BuildingId> {
        match *self {
            JobKind::Charge { station } => Some(station),
            JobKind::Sleep { bed } => bed,
            JobKind::Eat { seat } => Some(seat),
            JobKind::Relax { building } => building,
            JobKind::Research { lab } => Some(lab),
            JobKind::Maintain { building } | JobKind::ManageHeat { building } => Some(building),
        }
    }
}

/// Scores candidate tasks. Implementations hold no per-pulse state; every
/// score is recomputed from the world each time it is asked for.
pub trait MetaTask: Send + Sync {
    fn name(&self) -> &'static str;

    fn scope(&self) -> MetaTaskScope {
        MetaTaskScope::Worker
    }

    /// Whether this kind of worker can ever do the task.
    fn is_eligible(&self, worker: &WorkerView) -> bool;

    /// Candidate jobs for one worker. Zero-score jobs are dropped by the caller.
    fn worker_jobs(&self, _worker: &WorkerView, _ctx: &MetaContext, _rng: &mut SimRng) -> Vec<TaskJob> {
        Vec::new()
    }

    /// Jobs posted for the whole settlement.
    fn settlement_jobs(&self, _ctx: &MetaContext) -> Vec<TaskJob> {
        Vec::new()
    }

    /// Score of a posted job for one worker. 0 means not for this worker.
    fn score_settlement_job(&self, job: &TaskJob, _worker: &WorkerView, _ctx: &MetaContext) -> f32 {
        job.score
    }
}

pub struct MetaTaskRegistry {
    metas: Vec<Box<dyn MetaTask>>,
}

impl MetaTaskRegistry {
    pub fn new() -> Self {
        Self { metas: Vec::new() }
    }

    /// Registry with every built-in meta task.
    pub fn standard() -> Self {
        Self::from_names(BUILTIN_META_TASKS.iter().copied())
    }

    /// Registry with the named meta tasks. Unknown names are logged and skipped.
    pub fn from_names<'n>(names: impl IntoIterator<Item = &'n str>) -> Self {
        let mut registry = Self::new();
        for name in names {
            match builtin(name) {
                Some(meta) => {
                    if registry.find(name).is_some() {
                        log::warn!("Meta task '{}' listed twice, ignoring repeat", name);
                        continue;
                    }
                    registry.register(meta);
                }
                None => log::warn!("Unknown meta task '{}' skipped", name),
            }
        }
        log::info!("Registered {} meta tasks", registry.len());
        registry
    }

    pub fn register(&mut self, meta: Box<dyn MetaTask>) {
        self.metas.push(meta);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MetaTask> {
        self.metas.iter().map(|m| m.as_ref())
    }

    pub fn find(&self, name: &str) -> Option<&dyn MetaTask> {
        self.iter().find(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

impl Default for MetaTaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin(name: &str) -> Option<Box<dyn MetaTask>> {
    let meta: Box<dyn MetaTask> = match name {
        "charge" => Box::new(ChargeMeta),
        "sleep" => Box::new(SleepMeta),
        "eat" => Box::new(EatMeta),
        "relax" => Box::new(RelaxMeta),
        "research" => Box::new(ResearchMeta),
        "manage_heat" => Box::new(ManageHeatMeta),
        "maintenance" => Box::new(MaintenanceMeta),
        _ => return None,
    };
    Some(meta)
}
