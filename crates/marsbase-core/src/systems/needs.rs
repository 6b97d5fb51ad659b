//! Worker condition system - needs grow, batteries drain

use hecs::World;

use crate::components::{Battery, PhysicalCondition};
use crate::config::SimConfig;
use crate::task::TaskPhase;
use crate::task_manager::TaskManager;

/// Grow person needs and drain robot batteries over `millisols`.
/// Robots sitting at a charger don't drain.
pub fn worker_condition_system(world: &mut World, millisols: f64, config: &SimConfig) {
    for (_, condition) in world.query_mut::<&mut PhysicalCondition>() {
        condition.grow(millisols, &config.persons);
    }

    let drain = config.robots.drain_rate * millisols as f32;
    for (_, (battery, manager)) in world.query_mut::<(&mut Battery, Option<&TaskManager>)>() {
        let charging = manager.is_some_and(|m| m.phase() == Some(TaskPhase::Charging));
        if !charging {
            battery.drain(drain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_grow_and_batteries_drain() {
        let mut world = World::new();
        let config = SimConfig::default();
        let person = world.spawn((PhysicalCondition::default(),));
        let robot = world.spawn((Battery::new(50.0), TaskManager::default()));

        worker_condition_system(&mut world, 100.0, &config);

        let c = *world.get::<&PhysicalCondition>(person).unwrap();
        assert!((c.hunger - 0.25).abs() < 1e-5);
        assert!((c.fatigue - 0.1).abs() < 1e-5);
        let level = world.get::<&Battery>(robot).unwrap().level;
        assert!((level - 45.0).abs() < 1e-4);
    }
}
