use marsbase_logic::scoring::{finalize, performance_modifier, preference_jitter, skill_modifier};
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{
    performance_rating, BuildingId, JobType, Laboratory, NeedType, PhysicalCondition, Skills,
};
use crate::facilities::{self, FacilityKind};
use crate::meta::{JobKind, MetaContext, MetaTask, TaskJob, WorkerView};
use crate::SimRng;

const NAME: &str = "Research";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchTask {
    bench: Option<BuildingId>,
    /// Research points produced by this task so far.
    produced: f64,
}

impl ResearchTask {
    /// Take a bench at `lab`. Ends immediately if none is free.
    pub fn create(ctx: &mut TaskContext, lab: BuildingId) -> Task {
        if !facilities::acquire(ctx.world, ctx.directory, lab, FacilityKind::LabBench) {
            return Task::ended(
                NAME,
                format!("No free bench at {}", lab),
                TaskKind::Research(ResearchTask {
                    bench: None,
                    produced: 0.0,
                }),
            );
        }
        let mut task = Task::new(
            NAME,
            format!("Researching at {}", lab),
            TaskPhase::Researching,
            ctx.config.persons.research_duration,
            TaskKind::Research(ResearchTask {
                bench: Some(lab),
                produced: 0.0,
            }),
        );
        task.walk_to(ctx, lab);
        task
    }

    pub fn produced(&self) -> f64 {
        self.produced
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        if phase != TaskPhase::Researching {
            return Err(TaskError::unexpected_phase(NAME, phase));
        }
        let Some(lab) = self.bench else {
            return Err(TaskError::InvalidState {
                task: NAME.to_string(),
                detail: "researching without a bench".into(),
            });
        };
        let lab_entity = ctx.building_entity(lab)?;
        let science = ctx.world.get::<&Skills>(ctx.worker)?.science;

        let mut condition = ctx.world.get::<&mut PhysicalCondition>(ctx.worker)?;
        let performance = performance_rating(Some(&*condition), None);
        let points = time * (skill_modifier(science) * performance) as f64;
        condition.add(NeedType::Fatigue, ctx.config.persons.work_fatigue * time as f32);

        ctx.world.get::<&mut Laboratory>(lab_entity)?.research_points += points;
        self.produced += points;
        Ok(StepOutcome::Continue { leftover: 0.0 })
    }

    pub(super) fn clear_down(&mut self, ctx: &mut TaskContext) {
        if let Some(lab) = self.bench.take() {
            facilities::release(ctx.world, ctx.directory, lab, FacilityKind::LabBench);
        }
    }
}

pub struct ResearchMeta;

impl ResearchMeta {
    fn job_modifier(job: Option<JobType>) -> f32 {
        match job {
            Some(JobType::Scientist) => 1.0,
            _ => 0.25,
        }
    }
}

impl MetaTask for ResearchMeta {
    fn name(&self) -> &'static str {
        "research"
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.is_person()
    }

    fn worker_jobs(&self, worker: &WorkerView, ctx: &MetaContext, rng: &mut SimRng) -> Vec<TaskJob> {
        let Some(lab) = facilities::find_free(ctx.world, FacilityKind::LabBench, rng) else {
            return Vec::new();
        };
        let score = 10.0
            * skill_modifier(worker.skills.science)
            * performance_modifier(worker.performance)
            * Self::job_modifier(worker.job);
        vec![TaskJob {
            meta: self.name(),
            score: finalize(score * preference_jitter(rng)),
            kind: JobKind::Research { lab },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::facilities::Occupancy;
    use crate::components::{BuildingKind, Station};

    fn lab(fx: &mut Fixture, benches: u32) -> BuildingId {
        fx.building(
            BuildingKind::Laboratory,
            (Laboratory {
                benches: Station::new(benches),
                research_points: 0.0,
            },),
        )
    }

    #[test]
    fn research_accumulates_points() {
        let mut fx = Fixture::new();
        let l = lab(&mut fx, 1);
        let person = fx.person(JobType::Scientist, Some(l));

        let mut ctx = fx.ctx(person);
        let mut task = ResearchTask::create(&mut ctx, l);
        task.perform_mapped_phase(10.0, &mut ctx).unwrap();

        // Skill 0.5 gives a 1.0 modifier; a rested person performs at 1.0.
        let entity = fx.directory.building(l).unwrap();
        let points = fx.world.get::<&Laboratory>(entity).unwrap().research_points;
        assert!((points - 10.0).abs() < 1e-6);
        assert!(fx.world.get::<&PhysicalCondition>(person).unwrap().fatigue > 0.0);
    }

    #[test]
    fn scientists_score_higher() {
        let mut fx = Fixture::new();
        lab(&mut fx, 4);
        let scientist = fx.person(JobType::Scientist, None);
        let chef = fx.person(JobType::Chef, None);
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

        let s = WorkerView::read(&fx.world, scientist).unwrap();
        let c = WorkerView::read(&fx.world, chef).unwrap();
        let s_score = ResearchMeta.worker_jobs(&s, &ctx, &mut fx.rng)[0].score;
        let c_score = ResearchMeta.worker_jobs(&c, &ctx, &mut fx.rng)[0].score;
        // Jitter is at most 1.5x between two draws; the job gap is 4x.
        assert!(s_score > c_score);
    }

    #[test]
    fn full_lab_has_no_jobs() {
        let mut fx = Fixture::new();
        lab(&mut fx, 0);
        let scientist = fx.person(JobType::Scientist, None);
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
        let view = WorkerView::read(&fx.world, scientist).unwrap();
        assert!(ResearchMeta.worker_jobs(&view, &ctx, &mut fx.rng).is_empty());
    }
}
