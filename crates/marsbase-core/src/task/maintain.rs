//! Building maintenance: servicing worn equipment back to pristine.
//!
//! Maintenance is a settlement job. Worn buildings are posted to the job
//! board once per pulse and the worksite station (capacity 1) ensures only
//! one worker services a building at a time, however many were offered it.

use marsbase_logic::constants::maintenance::PRISTINE;
use marsbase_logic::scoring::{crowding_modifier, finalize, performance_modifier, skill_modifier};
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{
    performance_rating, Battery, Building, BuildingId, Maintenance, NeedType, PhysicalCondition,
    RobotType, Skills, Worker,
};
use crate::facilities::{self, FacilityKind};
use crate::meta::{JobKind, MetaContext, MetaTask, MetaTaskScope, TaskJob, WorkerView};

const NAME: &str = "Maintain";

/// Base score of a job on a building worn down to nothing.
const MAX_JOB_SCORE: f32 = 20.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintainTask {
    building: BuildingId,
    /// Held worksite; cleared on release.
    worksite: Option<BuildingId>,
}

impl MaintainTask {
    /// Claim the worksite at `building`. Ends immediately when someone else
    /// already holds it.
    pub fn create(ctx: &mut TaskContext, building: BuildingId) -> Task {
        if !facilities::acquire(ctx.world, ctx.directory, building, FacilityKind::Worksite) {
            return Task::ended(
                NAME,
                format!("{} is already being serviced", building),
                TaskKind::Maintain(MaintainTask {
                    building,
                    worksite: None,
                }),
            );
        }
        let mut task = Task::new(
            NAME,
            format!("Servicing {}", building),
            TaskPhase::Maintaining,
            ctx.config.maintenance.shift_length,
            TaskKind::Maintain(MaintainTask {
                building,
                worksite: Some(building),
            }),
        );
        task.walk_to(ctx, building);
        task
    }

    pub fn building(&self) -> BuildingId {
        self.building
    }

    /// Skill-weighted work per millisol for the worker.
    fn work_rate(ctx: &TaskContext) -> Result<f64, TaskError> {
        let worker = ctx.world.get::<&Worker>(ctx.worker)?;
        let mut mechanics = ctx.world.get::<&Skills>(ctx.worker)?.mechanics;
        if worker.robot_type() == Some(RobotType::Repairbot) {
            mechanics = mechanics.max(0.75);
        }
        let condition = ctx.world.get::<&PhysicalCondition>(ctx.worker).ok();
        let battery = ctx.world.get::<&Battery>(ctx.worker).ok();
        let performance = performance_rating(condition.as_deref(), battery.as_deref());
        Ok((skill_modifier(mechanics) * performance) as f64)
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        if phase != TaskPhase::Maintaining {
            return Err(TaskError::unexpected_phase(NAME, phase));
        }
        let rate = Self::work_rate(ctx)?;
        let entity = ctx.building_entity(self.building)?;

        if let Ok(mut condition) = ctx.world.get::<&mut PhysicalCondition>(ctx.worker) {
            condition.add(NeedType::Fatigue, ctx.config.persons.work_fatigue * time as f32);
        }

        let mut maintenance = ctx.world.get::<&mut Maintenance>(entity)?;
        let needed = (maintenance.required_work - maintenance.effective_work).max(0.0) / rate;
        if needed <= time {
            let remaining = maintenance.required_work - maintenance.effective_work;
            maintenance.add_work(remaining);
            log::debug!("{} serviced back to {}", self.building, PRISTINE);
            return Ok(StepOutcome::Finished {
                leftover: time - needed,
            });
        }
        maintenance.add_work(rate * time);
        Ok(StepOutcome::Continue { leftover: 0.0 })
    }

    pub(super) fn clear_down(&mut self, ctx: &mut TaskContext) {
        if let Some(building) = self.worksite.take() {
            facilities::release(ctx.world, ctx.directory, building, FacilityKind::Worksite);
        }
    }
}

/// Posts one job per worn building with a free worksite.
pub struct MaintenanceMeta;

impl MetaTask for MaintenanceMeta {
    fn name(&self) -> &'static str {
        "maintenance"
    }

    fn scope(&self) -> MetaTaskScope {
        MetaTaskScope::Settlement
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.is_mechanic()
    }

    fn settlement_jobs(&self, ctx: &MetaContext) -> Vec<TaskJob> {
        let threshold = ctx.config.maintenance.threshold;
        let mut jobs: Vec<TaskJob> = ctx
            .world
            .query::<(&Building, &Maintenance)>()
            .iter()
            .filter(|(_, (_, m))| m.needs_service(threshold) && !m.worksite.is_full())
            .map(|(_, (b, m))| TaskJob {
                meta: self.name(),
                score: finalize((PRISTINE - m.condition) / PRISTINE * MAX_JOB_SCORE),
                kind: JobKind::Maintain { building: b.id },
            })
            .collect();
        jobs.sort_by_key(|j| j.kind.target());
        jobs
    }

    fn score_settlement_job(&self, job: &TaskJob, worker: &WorkerView, ctx: &MetaContext) -> f32 {
        if !worker.is_mechanic() {
            return 0.0;
        }
        let crowding = job
            .kind
            .target()
            .and_then(|id| ctx.directory.building(id))
            .and_then(|e| ctx.world.get::<&Building>(e).ok().map(|b| (b.id, b.capacity)))
            .map(|(id, capacity)| crowding_modifier(ctx.occupancy.of(id), capacity))
            .unwrap_or(1.0);
        finalize(
            job.score
                * skill_modifier(worker.mechanics())
                * performance_modifier(worker.performance)
                * crowding,
        )
    }
}
