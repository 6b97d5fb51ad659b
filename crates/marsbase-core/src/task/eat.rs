use marsbase_logic::scoring::{finalize, need_urgency, preference_jitter};
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{BuildingId, NeedType, PhysicalCondition};
use crate::facilities::{self, FacilityKind};
use crate::meta::{JobKind, MetaContext, MetaTask, TaskJob, WorkerView};
use crate::SimRng;

const NAME: &str = "Eat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EatTask {
    seat: Option<BuildingId>,
    /// Millisols spent at the counter so far.
    served: f64,
}

impl EatTask {
    /// Take a dining seat at `canteen`. Ends immediately if none is free.
    pub fn create(ctx: &mut TaskContext, canteen: BuildingId) -> Task {
        if !facilities::acquire(ctx.world, ctx.directory, canteen, FacilityKind::DiningSeat) {
            return Task::ended(
                NAME,
                format!("No free seat at {}", canteen),
                TaskKind::Eat(EatTask {
                    seat: None,
                    served: 0.0,
                }),
            );
        }
        let mut task = Task::new(
            NAME,
            format!("Eating at {}", canteen),
            TaskPhase::PickingUpFood,
            ctx.config.persons.serve_time + ctx.config.persons.eat_duration,
            TaskKind::Eat(EatTask {
                seat: Some(canteen),
                served: 0.0,
            }),
        );
        task.walk_to(ctx, canteen);
        task
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        match phase {
            TaskPhase::PickingUpFood => Ok(self.pick_up(time, ctx)),
            TaskPhase::Eating => Self::eat(time, ctx),
            other => Err(TaskError::unexpected_phase(NAME, other)),
        }
    }

    fn pick_up(&mut self, time: f64, ctx: &TaskContext) -> StepOutcome {
        let needed = (ctx.config.persons.serve_time - self.served).max(0.0);
        if needed <= time {
            self.served += needed;
            return StepOutcome::Transition {
                next: TaskPhase::Eating,
                leftover: time - needed,
            };
        }
        self.served += time;
        StepOutcome::Continue { leftover: 0.0 }
    }

    fn eat(time: f64, ctx: &TaskContext) -> Result<StepOutcome, TaskError> {
        let rate = ctx.config.persons.eat_relief as f64;
        let mut condition = ctx.world.get::<&mut PhysicalCondition>(ctx.worker)?;
        let to_full = condition.hunger as f64 / rate;
        if to_full <= time {
            condition.relieve(NeedType::Hunger, 1.0);
            return Ok(StepOutcome::Finished {
                leftover: time - to_full,
            });
        }
        condition.relieve(NeedType::Hunger, (rate * time) as f32);
        Ok(StepOutcome::Continue { leftover: 0.0 })
    }

    pub(super) fn clear_down(&mut self, ctx: &mut TaskContext) {
        if let Some(seat) = self.seat.take() {
            facilities::release(ctx.world, ctx.directory, seat, FacilityKind::DiningSeat);
        }
    }
}

/// Hungry persons look for a free dining seat.
pub struct EatMeta;

impl MetaTask for EatMeta {
    fn name(&self) -> &'static str {
        "eat"
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.condition.is_some()
    }

    fn worker_jobs(&self, worker: &WorkerView, ctx: &MetaContext, rng: &mut SimRng) -> Vec<TaskJob> {
        let Some(condition) = worker.condition else {
            return Vec::new();
        };
        if condition.hunger < 0.15 {
            return Vec::new();
        }
        let Some(seat) = facilities::find_free(ctx.world, FacilityKind::DiningSeat, rng) else {
            return Vec::new();
        };
        vec![TaskJob {
            meta: self.name(),
            score: finalize(need_urgency(condition.hunger, 25.0) * preference_jitter(rng)),
            kind: JobKind::Eat { seat },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::facilities::Occupancy;
    use crate::components::{BuildingKind, Dining, JobType, Station};

    #[test]
    fn no_seat_ends_immediately() {
        let mut fx = Fixture::new();
        let canteen = fx.building(
            BuildingKind::Canteen,
            (Dining {
                seats: Station::new(0),
            },),
        );
        let person = fx.person(JobType::Chef, None);
        let task = EatTask::create(&mut fx.ctx(person), canteen);
        assert!(task.is_done());
    }

    #[test]
    fn meal_returns_unused_time() {
        let mut fx = Fixture::new();
        let canteen = fx.building(
            BuildingKind::Canteen,
            (Dining {
                seats: Station::new(2),
            },),
        );
        let person = fx.person(JobType::Chef, Some(canteen));
        fx.world.get::<&mut PhysicalCondition>(person).unwrap().hunger = 1.0;

        let mut ctx = fx.ctx(person);
        let mut task = EatTask::create(&mut ctx, canteen);
        // 5 millisols at the counter and a 40 millisol meal clear full
        // hunger; the rest is handed back.
        let leftover = task.perform_mapped_phase(60.0, &mut ctx).unwrap();
        assert!(task.is_done());
        assert!((leftover - 15.0).abs() < 1e-6);

        let hunger = fx.world.get::<&PhysicalCondition>(person).unwrap().hunger;
        assert!(hunger < 0.01, "hunger {}", hunger);
        let seats =
            facilities::station_of(&fx.world, &fx.directory, canteen, FacilityKind::DiningSeat).unwrap();
        assert_eq!(seats.occupied(), 0);
    }

    #[test]
    fn one_call_crosses_from_counter_to_meal() {
        let mut fx = Fixture::new();
        let canteen = fx.building(
            BuildingKind::Canteen,
            (Dining {
                seats: Station::new(1),
            },),
        );
        let person = fx.person(JobType::Chef, Some(canteen));
        fx.world.get::<&mut PhysicalCondition>(person).unwrap().hunger = 1.0;

        let mut ctx = fx.ctx(person);
        let mut task = EatTask::create(&mut ctx, canteen);
        assert_eq!(task.phase(), Some(TaskPhase::PickingUpFood));

        task.perform_mapped_phase(3.0, &mut ctx).unwrap();
        assert_eq!(task.phase(), Some(TaskPhase::PickingUpFood));

        // 2 more millisols at the counter, then 8 of eating.
        let leftover = task.perform_mapped_phase(10.0, &mut ctx).unwrap();
        assert_eq!(leftover, 0.0);
        assert_eq!(task.phase(), Some(TaskPhase::Eating));
        assert!((task.time_completed() - 13.0).abs() < 1e-9);
        assert!(!task.is_done());

        let hunger = fx.world.get::<&PhysicalCondition>(person).unwrap().hunger;
        assert!((hunger - 0.8).abs() < 1e-4, "hunger {}", hunger);
    }

    #[test]
    fn meta_needs_a_seat() {
        let mut fx = Fixture::new();
        let person = fx.person(JobType::Chef, None);
        fx.world.get::<&mut PhysicalCondition>(person).unwrap().hunger = 0.9;
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
        assert!(EatMeta.worker_jobs(&view, &ctx, &mut fx.rng).is_empty());
    }
}
