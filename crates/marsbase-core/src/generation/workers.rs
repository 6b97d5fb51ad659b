//! Person and robot spawning

use hecs::{Entity, World};

use crate::components::*;
use crate::directory::Directory;
use crate::task_manager::TaskManager;

pub struct PersonSpec {
    pub name: String,
    pub job: JobType,
    pub skills: Skills,
    pub location: Option<BuildingId>,
}

pub struct RobotSpec {
    pub name: String,
    pub robot_type: RobotType,
    pub battery: f32,
    pub location: Option<BuildingId>,
}

/// Skills robots come built with.
pub fn robot_skills(robot_type: RobotType) -> Skills {
    match robot_type {
        RobotType::Repairbot => Skills {
            mechanics: 0.8,
            science: 0.0,
        },
        RobotType::Makerbot => Skills {
            mechanics: 0.5,
            science: 0.2,
        },
        RobotType::Chefbot | RobotType::Deliverybot => Skills {
            mechanics: 0.2,
            science: 0.0,
        },
    }
}

pub fn spawn_person(
    world: &mut World,
    directory: &mut Directory,
    spec: PersonSpec,
    log_capacity: usize,
) -> (WorkerId, Entity) {
    let id = directory.allocate_worker_id();
    let entity = world.spawn((
        Worker {
            id,
            name: spec.name,
            kind: WorkerKind::Person,
        },
        Job(spec.job),
        spec.skills,
        Location {
            building: spec.location,
        },
        PhysicalCondition::default(),
        TaskManager::new(log_capacity),
    ));
    directory.insert_worker(id, entity);
    (id, entity)
}

pub fn spawn_robot(
    world: &mut World,
    directory: &mut Directory,
    spec: RobotSpec,
    log_capacity: usize,
) -> (WorkerId, Entity) {
    let id = directory.allocate_worker_id();
    let entity = world.spawn((
        Worker {
            id,
            name: spec.name,
            kind: WorkerKind::Robot(spec.robot_type),
        },
        robot_skills(spec.robot_type),
        Location {
            building: spec.location,
        },
        Battery::new(spec.battery),
        TaskManager::new(log_capacity),
    ));
    directory.insert_worker(id, entity);
    (id, entity)
}
