use marsbase_logic::constants::heat;
use marsbase_logic::scoring::{finalize, performance_modifier, preference_jitter, skill_modifier};
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{Building, BuildingId, HeatGeneration, HeatLoad};
use crate::meta::{JobKind, MetaContext, MetaTask, TaskJob, WorkerView};
use crate::SimRng;

const NAME: &str = "Manage Heat";

/// Switch a building's electric heaters to boost until the next sol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManageHeatTask {
    building: BuildingId,
    progress: f64,
}

impl ManageHeatTask {
    pub fn create(ctx: &mut TaskContext, building: BuildingId) -> Task {
        let mut task = Task::new(
            NAME,
            format!("Adjusting heaters in {}", building),
            TaskPhase::AdjustingHeaters,
            0.0,
            TaskKind::ManageHeat(ManageHeatTask {
                building,
                progress: 0.0,
            }),
        );
        task.walk_to(ctx, building);
        task
    }

    pub fn building(&self) -> BuildingId {
        self.building
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        if phase != TaskPhase::AdjustingHeaters {
            return Err(TaskError::unexpected_phase(NAME, phase));
        }
        let needed = (ctx.config.maintenance.heater_adjust_time - self.progress).max(0.0);
        if time < needed {
            self.progress += time;
            return Ok(StepOutcome::Continue { leftover: 0.0 });
        }

        let entity = ctx.building_entity(self.building)?;
        ctx.world.get::<&mut HeatGeneration>(entity)?.boosted = true;
        self.progress += needed;
        log::debug!("Heaters boosted in {}", self.building);
        Ok(StepOutcome::Finished {
            leftover: time - needed,
        })
    }
}

/// Mechanics boost heaters while the settlement runs short of heat.
pub struct ManageHeatMeta;

impl ManageHeatMeta {
    /// Building with the largest heat deficit that still has an unboosted
    /// electric heater. Lowest id wins ties.
    fn coldest(ctx: &MetaContext) -> Option<BuildingId> {
        let mut best: Option<(BuildingId, f32)> = None;
        for (_, (building, generation, load)) in ctx
            .world
            .query::<(&Building, &HeatGeneration, &HeatLoad)>()
            .iter()
        {
            if generation.boosted || !generation.has_electric_heater() {
                continue;
            }
            let deficit = load.current - generation.current;
            let better = match best {
                None => true,
                Some((id, d)) => deficit > d || (deficit == d && building.id < id),
            };
            if better {
                best = Some((building.id, deficit));
            }
        }
        best.map(|(id, _)| id)
    }
}

impl MetaTask for ManageHeatMeta {
    fn name(&self) -> &'static str {
        "manage_heat"
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.is_mechanic()
    }

    fn worker_jobs(&self, worker: &WorkerView, ctx: &MetaContext, rng: &mut SimRng) -> Vec<TaskJob> {
        let value = ctx.status.heat_value;
        if value <= heat::WORTHWHILE_VALUE {
            return Vec::new();
        }
        let Some(building) = Self::coldest(ctx) else {
            return Vec::new();
        };
        let score = (value - heat::WORTHWHILE_VALUE)
            * 10.0
            * skill_modifier(worker.mechanics())
            * performance_modifier(worker.performance);
        vec![TaskJob {
            meta: self.name(),
            score: finalize(score * preference_jitter(rng)),
            kind: JobKind::ManageHeat { building },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::facilities::Occupancy;
    use crate::components::{BuildingKind, HeatSource, JobType};
    use marsbase_logic::energy::HeatSourceKind;

    fn heated(fx: &mut Fixture, load: f32, supply: f32) -> BuildingId {
        fx.building(
            BuildingKind::Habitat,
            (
                HeatGeneration {
                    sources: vec![HeatSource {
                        kind: HeatSourceKind::ElectricHeater,
                        max_kw: 10.0,
                    }],
                    current: supply,
                    ..Default::default()
                },
                HeatLoad {
                    base_kw: load,
                    current: load,
                },
            ),
        )
    }

    #[test]
    fn boosts_after_adjust_time() {
        let mut fx = Fixture::new();
        let hab = heated(&mut fx, 10.0, 5.0);
        let tech = fx.person(JobType::Technician, Some(hab));

        let mut ctx = fx.ctx(tech);
        let mut task = ManageHeatTask::create(&mut ctx, hab);
        let leftover = task.perform_mapped_phase(20.0, &mut ctx).unwrap();
        assert!(task.is_done());
        assert!((leftover - 5.0).abs() < 1e-9);

        let entity = fx.directory.building(hab).unwrap();
        assert!(fx.world.get::<&HeatGeneration>(entity).unwrap().boosted);
    }

    #[test]
    fn only_offered_when_heat_is_short() {
        let mut fx = Fixture::new();
        heated(&mut fx, 10.0, 5.0);
        let cold = heated(&mut fx, 30.0, 5.0);
        let engineer = fx.person(JobType::Engineer, None);
        let view = WorkerView::read(&fx.world, engineer).unwrap();

        let mut status = fx.status.clone();
        status.heat_value = 0.8;
        let occupancy = Occupancy::count(&fx.world);
        let ctx = MetaContext::new(
            &fx.world,
            &fx.directory,
            &status,
            &fx.config,
            &occupancy,
            fx.pulse.time,
        );
        assert!(ManageHeatMeta.worker_jobs(&view, &ctx, &mut fx.rng).is_empty());

        status.heat_value = 2.0;
        let occupancy = Occupancy::count(&fx.world);
        let ctx = MetaContext::new(
            &fx.world,
            &fx.directory,
            &status,
            &fx.config,
            &occupancy,
            fx.pulse.time,
        );
        let jobs = ManageHeatMeta.worker_jobs(&view, &ctx, &mut fx.rng);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, JobKind::ManageHeat { building: cold });
    }
}
