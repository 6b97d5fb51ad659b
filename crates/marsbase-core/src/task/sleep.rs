use marsbase_logic::energy::sunlight_factor;
use marsbase_logic::scoring::{finalize, need_urgency, preference_jitter};
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{BuildingId, NeedType, PhysicalCondition};
use crate::facilities::{self, FacilityKind};
use crate::meta::{JobKind, MetaContext, MetaTask, TaskJob, WorkerView};
use crate::SimRng;

const NAME: &str = "Sleep";

/// Sleeping without a bed only recovers this share of the usual rest.
const NO_BED_EFFECTIVENESS: f32 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepTask {
    bed: Option<BuildingId>,
}

impl SleepTask {
    /// Sleep in a bed at `bed` if one is free, otherwise wherever the worker is.
    pub fn create(ctx: &mut TaskContext, bed: Option<BuildingId>) -> Task {
        let bed = bed.filter(|b| facilities::acquire(ctx.world, ctx.directory, *b, FacilityKind::Bed));
        let description = match bed {
            Some(b) => format!("Sleeping in a bed at {}", b),
            None => "Sleeping rough".to_string(),
        };
        let mut task = Task::new(
            NAME,
            description,
            TaskPhase::Sleeping,
            ctx.config.persons.sleep_duration,
            TaskKind::Sleep(SleepTask { bed }),
        );
        if let Some(b) = bed {
            task.walk_to(ctx, b);
        }
        task
    }

    pub fn bed(&self) -> Option<BuildingId> {
        self.bed
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        if phase != TaskPhase::Sleeping {
            return Err(TaskError::unexpected_phase(NAME, phase));
        }
        let effectiveness = if self.bed.is_some() { 1.0 } else { NO_BED_EFFECTIVENESS };
        let rate = (ctx.config.persons.sleep_relief * effectiveness) as f64;
        let mut condition = ctx.world.get::<&mut PhysicalCondition>(ctx.worker)?;

        // Wake up once fully rested.
        let to_rested = condition.fatigue as f64 / rate;
        if to_rested <= time {
            condition.relieve(NeedType::Fatigue, 1.0);
            return Ok(StepOutcome::Finished {
                leftover: time - to_rested,
            });
        }
        condition.relieve(NeedType::Fatigue, (rate * time) as f32);
        Ok(StepOutcome::Continue { leftover: 0.0 })
    }

    pub(super) fn clear_down(&mut self, ctx: &mut TaskContext) {
        if let Some(bed) = self.bed.take() {
            facilities::release(ctx.world, ctx.directory, bed, FacilityKind::Bed);
        }
    }
}

pub struct SleepMeta;

impl MetaTask for SleepMeta {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.condition.is_some()
    }

    fn worker_jobs(&self, worker: &WorkerView, ctx: &MetaContext, rng: &mut SimRng) -> Vec<TaskJob> {
        let Some(condition) = worker.condition else {
            return Vec::new();
        };
        if condition.fatigue < 0.2 {
            return Vec::new();
        }
        let mut score = need_urgency(condition.fatigue, 30.0);
        if sunlight_factor(ctx.now.millisol()) == 0.0 {
            score += 5.0;
        }
        let bed = facilities::find_free(ctx.world, FacilityKind::Bed, rng);
        if bed.is_none() {
            score *= NO_BED_EFFECTIVENESS;
        }
        vec![TaskJob {
            meta: self.name(),
            score: finalize(score * preference_jitter(rng)),
            kind: JobKind::Sleep { bed },
        }]
    }
}
