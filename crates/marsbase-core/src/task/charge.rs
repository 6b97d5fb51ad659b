//! Robot recharging at a robotic station.

use marsbase_logic::constants::battery;
use marsbase_logic::scoring::{battery_urgency, finalize, preference_jitter};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{Battery, BuildingId};
use crate::facilities::{self, FacilityKind};
use crate::meta::{JobKind, MetaContext, MetaTask, TaskJob, WorkerView};
use crate::SimRng;

const NAME: &str = "Charge";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeTask {
    /// Station whose slot this task holds.
    station: Option<BuildingId>,
}

impl ChargeTask {
    /// Take a slot at `station`, or the best free station if none is given.
    /// Ends immediately when no slot can be had.
    pub fn create(ctx: &mut TaskContext, station: Option<BuildingId>) -> Task {
        let station =
            station.or_else(|| facilities::find_free(ctx.world, FacilityKind::ChargingSlot, ctx.rng));
        let Some(station) = station else {
            return Task::ended(
                NAME,
                "No charging station available",
                TaskKind::Charge(ChargeTask { station: None }),
            );
        };
        if !facilities::acquire(ctx.world, ctx.directory, station, FacilityKind::ChargingSlot) {
            return Task::ended(
                NAME,
                format!("Charging station {} is full", station),
                TaskKind::Charge(ChargeTask { station: None }),
            );
        }

        let mut task = Task::new(
            NAME,
            format!("Recharging at {}", station),
            TaskPhase::Charging,
            0.0,
            TaskKind::Charge(ChargeTask {
                station: Some(station),
            }),
        );
        task.walk_to(ctx, station);
        task
    }

    pub fn station(&self) -> Option<BuildingId> {
        self.station
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        match phase {
            TaskPhase::Charging => self.charging_phase(time, ctx),
            other => Err(TaskError::unexpected_phase(NAME, other)),
        }
    }

    /// Charge until full, or stop once past the sufficient level when the
    /// keep-charging roll fails.
    fn charging_phase(&mut self, time: f64, ctx: &mut TaskContext) -> Result<StepOutcome, TaskError> {
        let rate = ctx.config.robots.charge_rate as f64;
        let mut battery = ctx.world.get::<&mut Battery>(ctx.worker)?;

        let to_full = (battery::FULL_LEVEL - battery.level).max(0.0) as f64 / rate;
        if to_full <= time {
            battery.charge(battery::FULL_LEVEL);
            return Ok(StepOutcome::Finished {
                leftover: time - to_full,
            });
        }

        battery.charge((rate * time) as f32);
        if battery.level >= battery::SUFFICIENT_LEVEL
            && !ctx.rng.gen_bool(ctx.config.robots.continue_charging_chance)
        {
            return Ok(StepOutcome::Finished { leftover: 0.0 });
        }
        Ok(StepOutcome::Continue { leftover: 0.0 })
    }

    pub(super) fn clear_down(&mut self, ctx: &mut TaskContext) {
        if let Some(station) = self.station.take() {
            facilities::release(ctx.world, ctx.directory, station, FacilityKind::ChargingSlot);
        }
    }
}

/// Robots below the recommended battery level look for a free slot.
pub struct ChargeMeta;

impl MetaTask for ChargeMeta {
    fn name(&self) -> &'static str {
        "charge"
    }

    fn is_eligible(&self, worker: &WorkerView) -> bool {
        worker.battery.is_some()
    }

    fn worker_jobs(&self, worker: &WorkerView, ctx: &MetaContext, rng: &mut SimRng) -> Vec<TaskJob> {
        let Some(level) = worker.battery else {
            return Vec::new();
        };
        let urgency = battery_urgency(level);
        if urgency <= 0.0 {
            return Vec::new();
        }
        let Some(station) = facilities::find_free(ctx.world, FacilityKind::ChargingSlot, rng) else {
            return Vec::new();
        };
        vec![TaskJob {
            meta: self.name(),
            score: finalize(urgency * preference_jitter(rng)),
            kind: JobKind::Charge { station },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::facilities::Occupancy;
    use crate::components::{BuildingKind, RoboticStation, Station};
    use crate::facilities::station_of;

    fn garage(fx: &mut Fixture, slots: u32) -> BuildingId {
        fx.building(
            BuildingKind::Garage,
            (RoboticStation {
                slots: Station::new(slots),
            },),
        )
    }

    #[test]
    fn no_station_ends_immediately() {
        let mut fx = Fixture::new();
        let robot = fx.robot(30.0, None);
        let mut ctx = fx.ctx(robot);
        let task = ChargeTask::create(&mut ctx, None);
        assert!(task.is_done());
        assert_eq!(task.time_completed(), 0.0);
    }

    #[test]
    fn full_station_ends_immediately() {
        let mut fx = Fixture::new();
        let g = garage(&mut fx, 1);
        let a = fx.robot(30.0, Some(g));
        let b = fx.robot(30.0, Some(g));

        let first = ChargeTask::create(&mut fx.ctx(a), Some(g));
        let second = ChargeTask::create(&mut fx.ctx(b), Some(g));
        assert!(!first.is_done());
        assert!(second.is_done());
        let occupied = station_of(&fx.world, &fx.directory, g, FacilityKind::ChargingSlot)
            .unwrap()
            .occupied();
        assert_eq!(occupied, 1);
    }

    #[test]
    fn charges_to_full_and_releases() {
        let mut fx = Fixture::new();
        fx.config.robots.continue_charging_chance = 1.0;
        let g = garage(&mut fx, 1);
        let robot = fx.robot(60.0, Some(g));

        let mut ctx = fx.ctx(robot);
        let mut task = ChargeTask::create(&mut ctx, None);
        // 40% at 0.5 per millisol is 80 millisols.
        let leftover = task.perform_mapped_phase(100.0, &mut ctx).unwrap();
        assert!(task.is_done());
        assert!((leftover - 20.0).abs() < 1e-6);

        assert!(fx.world.get::<&Battery>(robot).unwrap().is_full());
        let station = station_of(&fx.world, &fx.directory, g, FacilityKind::ChargingSlot).unwrap();
        assert_eq!(station.occupied(), 0);
    }

    #[test]
    fn meta_offers_only_when_low() {
        let mut fx = Fixture::new();
        let g = garage(&mut fx, 1);
        let charged = fx.robot(90.0, Some(g));
        let low = fx.robot(40.0, Some(g));
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

        let view = WorkerView::read(&fx.world, charged).unwrap();
        assert!(ChargeMeta.worker_jobs(&view, &ctx, &mut fx.rng).is_empty());

        let view = WorkerView::read(&fx.world, low).unwrap();
        let jobs = ChargeMeta.worker_jobs(&view, &ctx, &mut fx.rng);
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].score > 0.0);
    }
}
