//! Settlement-wide aggregation of building power and heat.
//!
//! Recomputed from scratch every pulse after the buildings have updated.
//! Nothing is cached between pulses; the engine keeps the previous status
//! and compares it with the new one to emit change events.

use hecs::World;
use marsbase_logic::constants::heat::CHANGE_EPSILON;
use marsbase_logic::energy::heat_value;
use serde::{Deserialize, Serialize};

use crate::components::{Building, HeatGeneration, HeatLoad, PowerGeneration, WorkerId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementStatus {
    pub power_generated: f32,
    /// Sol-averaged output of every power source, ignoring wear.
    pub power_average: f32,
    pub power_required: f32,
    pub heat_generated: f32,
    pub heat_required: f32,
    /// Heat demand over supply. Above 1.0 heating work pays off.
    pub heat_value: f32,
}

impl SettlementStatus {
    pub fn compute(world: &World) -> Self {
        let mut status = Self::default();
        for (_, building) in world.query::<&Building>().iter() {
            status.power_required += building.base_power_load;
        }
        for (_, power) in world.query::<&PowerGeneration>().iter() {
            status.power_generated += power.current;
            status.power_average += power.average_output();
        }
        for (_, heating) in world.query::<&HeatGeneration>().iter() {
            status.heat_generated += heating.current;
            status.power_required += heating.power_draw;
        }
        for (_, load) in world.query::<&HeatLoad>().iter() {
            status.heat_required += load.current;
        }
        status.heat_value = heat_value(status.heat_required, status.heat_generated);
        status
    }

    pub fn power_surplus(&self) -> f32 {
        self.power_generated - self.power_required
    }

    /// Event for a heat value change against `previous`, if it moved.
    pub fn heat_change(&self, previous: &SettlementStatus) -> Option<SimEvent> {
        if (self.heat_value - previous.heat_value).abs() <= CHANGE_EPSILON {
            return None;
        }
        Some(SimEvent::HeatValueChanged {
            old: previous.heat_value,
            new: self.heat_value,
        })
    }
}

/// Observable things that happened during a pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    NewSol(u32),
    HeatValueChanged { old: f32, new: f32 },
    /// A task hit an invalid state and was force-ended.
    TaskFailed {
        worker: WorkerId,
        task: String,
        error: String,
    },
    WorkerRemoved(WorkerId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingId, BuildingKind};

    fn building(world: &mut World, id: u32, power: f32, heat: f32, load: f32) {
        world.spawn((
            Building {
                id: BuildingId(id),
                name: format!("B{}", id),
                kind: BuildingKind::Habitat,
                capacity: 4,
                base_power_load: 2.0,
            },
            PowerGeneration {
                sources: Vec::new(),
                current: power,
            },
            HeatGeneration {
                current: heat,
                power_draw: 1.0,
                ..Default::default()
            },
            HeatLoad {
                base_kw: load,
                current: load,
            },
        ));
    }

    #[test]
    fn sums_all_buildings() {
        let mut world = World::new();
        building(&mut world, 1, 10.0, 3.0, 8.0);
        building(&mut world, 2, 5.0, 1.0, 4.0);

        let status = SettlementStatus::compute(&world);
        assert_eq!(status.power_generated, 15.0);
        assert_eq!(status.power_required, 6.0);
        assert_eq!(status.heat_generated, 4.0);
        assert_eq!(status.heat_required, 12.0);
        assert!((status.heat_value - 12.0 / 5.0).abs() < 1e-6);
    }

    #[test]
    fn average_power_and_surplus() {
        use crate::components::PowerSource;
        use marsbase_logic::energy::PowerSourceKind;

        let mut world = World::new();
        building(&mut world, 1, 0.0, 0.0, 0.0);
        let plant = world.spawn((
            Building {
                id: BuildingId(2),
                name: "Plant".into(),
                kind: BuildingKind::PowerPlant,
                capacity: 4,
                base_power_load: 1.0,
            },
            PowerGeneration {
                sources: vec![PowerSource {
                    kind: PowerSourceKind::Nuclear,
                    max_kw: 20.0,
                }],
                current: 0.0,
            },
        ));

        // Nothing generated yet, but the plant still averages 20 kW.
        let status = SettlementStatus::compute(&world);
        assert_eq!(status.power_average, 20.0);
        assert_eq!(status.power_surplus(), -4.0);

        world.get::<&mut PowerGeneration>(plant).unwrap().current = 20.0;
        let status = SettlementStatus::compute(&world);
        assert_eq!(status.power_surplus(), 16.0);
    }

    #[test]
    fn empty_settlement_is_zero() {
        let status = SettlementStatus::compute(&World::new());
        assert_eq!(status, SettlementStatus::default());
    }

    #[test]
    fn heat_change_only_when_moved() {
        let before = SettlementStatus {
            heat_value: 1.0,
            ..Default::default()
        };
        let same = before;
        assert_eq!(same.heat_change(&before), None);

        let after = SettlementStatus {
            heat_value: 1.5,
            ..Default::default()
        };
        assert_eq!(
            after.heat_change(&before),
            Some(SimEvent::HeatValueChanged { old: 1.0, new: 1.5 })
        );
    }
}
