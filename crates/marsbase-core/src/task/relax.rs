use marsbase_logic::facility::{rank_facilities, FacilityCandidate};
use marsbase_logic::scoring::{crowding_modifier, finalize, need_urgency, preference_jitter};
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{Building, BuildingId, NeedType, PhysicalCondition};
use crate::meta::{JobKind, MetaContext, MetaTask, TaskJob, WorkerView};
use crate::SimRng;

const NAME: &str = "Relax";

/// Unstructured downtime. Needs no station, only somewhere to be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxTask {
    building: Option<BuildingId>,
}

impl RelaxTask {
    pub fn new(building: Option<BuildingId>) -> Self {
        Self { building }
    }

    pub fn create(ctx: &mut TaskContext, building: Option<BuildingId>) -> Task {
        let description = match building {
            Some(b) => format!("Relaxing in {}", b),
            None => "Relaxing".to_string(),
        };
        let mut task = Task::new(
            NAME,
            description,
            TaskPhase::Relaxing,
            ctx.config.persons.relax_duration,
            TaskKind::Relax(RelaxTask::new(building)),
        );
        if let Some(b) = building {
            task.walk_to(ctx, b);
        }
        task
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        if phase != TaskPhase::Relaxing {
            return Err(TaskError::unexpected_phase(NAME, phase));
        }
        let relief = ctx.config.persons.relax_relief * time as f32;
        ctx.world
            .get::<&mut PhysicalCondition>(ctx.worker)?
            .relieve(NeedType::Stress, relief);
        Ok(StepOutcome::Continue { leftover: 0.0 })
    }
}

/// Persons unwind in the least crowded building.
pub struct RelaxMeta;

impl RelaxMeta {
    fn quietest(ctx: &MetaContext, rng: &mut SimRng) -> Option<(BuildingId, f32)> {
        let mut list: Vec<FacilityCandidate<BuildingId>> = ctx
            .world
            .query::<&Building>()
            .iter()
            .map(|(_, b)| FacilityCandidate {
                id: b.id,
                occupied: ctx.occupancy.of(b.id),
                capacity: b.capacity,
            })
            .collect();
        list.sort_by_key(|c| c.id);
        let chosen = rank_facilities(&list, rng)?;
        let c = list.iter().find(|c| c.id == chosen)?;
        Some((chosen, crowding_modifier(c.occupied, c.capacity)))
    }
}

impl MetaTask for RelaxMeta {
    fn name(&self) -> &'static str {
        "relax"
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.condition.is_some()
    }

    fn worker_jobs(&self, worker: &WorkerView, ctx: &MetaContext, rng: &mut SimRng) -> Vec<TaskJob> {
        let Some(condition) = worker.condition else {
            return Vec::new();
        };
        // Fall back to unwinding on the spot when every building is packed.
        let (building, crowding) = Self::quietest(ctx, rng)
            .map(|(b, c)| (Some(b), c))
            .unwrap_or((worker.location, 0.5));
        let score = (need_urgency(condition.stress, 15.0) + 0.5) * crowding;
        vec![TaskJob {
            meta: self.name(),
            score: finalize(score * preference_jitter(rng)),
            kind: JobKind::Relax { building },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::facilities::Occupancy;
    use crate::components::{BuildingKind, JobType};

    #[test]
    fn relaxing_relieves_stress() {
        let mut fx = Fixture::new();
        let person = fx.person(JobType::Botanist, None);
        fx.world.get::<&mut PhysicalCondition>(person).unwrap().stress = 0.6;

        let mut ctx = fx.ctx(person);
        let mut task = RelaxTask::create(&mut ctx, None);
        task.perform_mapped_phase(20.0, &mut ctx).unwrap();
        assert!(!task.is_done());

        let stress = fx.world.get::<&PhysicalCondition>(person).unwrap().stress;
        assert!((stress - 0.4).abs() < 1e-5);
    }

    #[test]
    fn meta_prefers_quiet_building() {
        let mut fx = Fixture::new();
        let busy = fx.building(BuildingKind::Habitat, ());
        let quiet = fx.building(BuildingKind::Habitat, ());
        for _ in 0..6 {
            fx.person(JobType::Chef, Some(busy));
        }
        let person = fx.person(JobType::Chef, Some(busy));

        let status = fx.status.clone();
        let occupancy = Occupancy::count(&fx.world);
        let ctx = MetaContext::new(
            &fx.world,
            &fx.directory,
            &status,
            &fx.config,
            &occupancy,
            fx.pulse.time,
        );
        let view = WorkerView::read(&fx.world, person).unwrap();
        let jobs = RelaxMeta.worker_jobs(&view, &ctx, &mut fx.rng);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, JobKind::Relax { building: Some(quiet) });
    }
}
