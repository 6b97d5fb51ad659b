//! Simulation engine - main entry point for running the scheduler

use hecs::{Entity, World};
use marsbase_logic::clock::{ClockPulse, MarsTime, MasterClock};
use rand::{Rng, SeedableRng};

use crate::components::*;
use crate::config::SimConfig;
use crate::directory::Directory;
use crate::facilities::{station_of, FacilityKind, Occupancy};
use crate::generation::{
    default_base, robot_name, settler_name, spawn_building, spawn_person, spawn_robot,
    BuildingSpec, PersonSpec, RobotSpec,
};
use crate::meta::{MetaContext, MetaTaskRegistry};
use crate::persistence::{SimSnapshot, SnapshotError};
use crate::selection::{JobBoard, SelectionEngine};
use crate::settlement::{SettlementStatus, SimEvent};
use crate::systems::{building_function_system, worker_condition_system};
use crate::task::{TaskContext, TaskPhase};
use crate::task_manager::{OneActivity, TaskManager};
use crate::SimRng;

const ROBOT_ROTATION: [RobotType; 4] = [
    RobotType::Repairbot,
    RobotType::Deliverybot,
    RobotType::Chefbot,
    RobotType::Makerbot,
];

/// Main simulation engine
pub struct SimulationEngine {
    world: World,
    directory: Directory,
    config: SimConfig,
    registry: MetaTaskRegistry,
    clock: MasterClock,
    /// Settlement status from the latest pulse.
    status: SettlementStatus,
    board: JobBoard,
    /// Workers per building as of the latest pulse.
    occupancy: Occupancy,
    rng: SimRng,
    events: Vec<SimEvent>,
}

impl SimulationEngine {
    /// Create an empty settlement with the meta tasks named in the config.
    pub fn new(config: SimConfig) -> Self {
        let registry = MetaTaskRegistry::from_names(config.meta_tasks.iter().map(String::as_str));
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: SimConfig, registry: MetaTaskRegistry) -> Self {
        Self {
            world: World::new(),
            directory: Directory::new(),
            rng: SimRng::seed_from_u64(config.seed),
            config,
            registry,
            clock: MasterClock::new(),
            status: SettlementStatus::default(),
            board: JobBoard::new(),
            occupancy: Occupancy::default(),
            events: Vec::new(),
        }
    }

    /// Populate the default base from `config.base`.
    pub fn generate(&mut self) {
        let specs = default_base(&self.config.base, &self.config.facilities);
        let mut habitats = Vec::new();
        let mut garages = Vec::new();
        for spec in &specs {
            let id = self.add_building(spec);
            match spec.kind {
                BuildingKind::Habitat => habitats.push(id),
                BuildingKind::Garage => garages.push(id),
                _ => {}
            }
        }

        let persons = self.config.base.persons as usize;
        for i in 0..persons {
            let job = JobType::ALL[i % JobType::ALL.len()];
            let home = pick(&habitats, i);
            let name = settler_name(&mut self.rng);
            self.spawn_person(name, job, home);
        }

        let robots = self.config.base.robots as usize;
        for i in 0..robots {
            let robot_type = ROBOT_ROTATION[i % ROBOT_ROTATION.len()];
            let bay = pick(&garages, i);
            let battery = self.rng.gen_range(50.0..100.0);
            let (id, _) = spawn_robot(
                &mut self.world,
                &mut self.directory,
                RobotSpec {
                    name: robot_name(robot_type, i as u32 + 1),
                    robot_type,
                    battery,
                    location: bay,
                },
                self.config.scheduler.activity_log_capacity,
            );
            log::debug!("Spawned robot {}", id);
        }

        log::info!(
            "Generated base: {} buildings, {} persons, {} robots",
            specs.len(),
            persons,
            robots
        );
    }

    pub fn add_building(&mut self, spec: &BuildingSpec) -> BuildingId {
        spawn_building(
            &mut self.world,
            &mut self.directory,
            spec,
            &self.config.maintenance,
        )
    }

    /// Add a person with random skills leaning toward the job.
    pub fn spawn_person(
        &mut self,
        name: impl Into<String>,
        job: JobType,
        at: Option<BuildingId>,
    ) -> WorkerId {
        let skills = Skills::random(&mut self.rng, Some(job));
        let (id, _) = spawn_person(
            &mut self.world,
            &mut self.directory,
            PersonSpec {
                name: name.into(),
                job,
                skills,
                location: at,
            },
            self.config.scheduler.activity_log_capacity,
        );
        id
    }

    pub fn spawn_robot(
        &mut self,
        name: impl Into<String>,
        robot_type: RobotType,
        battery: f32,
        at: Option<BuildingId>,
    ) -> WorkerId {
        let (id, _) = spawn_robot(
            &mut self.world,
            &mut self.directory,
            RobotSpec {
                name: name.into(),
                robot_type,
                battery,
                location: at,
            },
            self.config.scheduler.activity_log_capacity,
        );
        id
    }

    /// Advance the simulation by `elapsed` millisols.
    pub fn pulse(&mut self, elapsed: f64) -> ClockPulse {
        let pulse = self.clock.advance(elapsed);
        if pulse.is_new_sol {
            self.events.push(SimEvent::NewSol(pulse.time.sol()));
        }

        building_function_system(&mut self.world, &pulse);

        let status = SettlementStatus::compute(&self.world);
        if let Some(event) = status.heat_change(&self.status) {
            log::debug!(
                "Heat value {:.3} -> {:.3}",
                self.status.heat_value,
                status.heat_value
            );
            self.events.push(event);
        }
        if status.power_surplus() < 0.0 && self.status.power_surplus() >= 0.0 {
            log::warn!(
                "Power deficit: {:.1} kW generated, {:.1} kW required",
                status.power_generated,
                status.power_required
            );
        }
        self.status = status;

        worker_condition_system(&mut self.world, pulse.elapsed, &self.config);
        self.occupancy = Occupancy::count(&self.world);

        let meta_ctx = MetaContext::new(
            &self.world,
            &self.directory,
            &self.status,
            &self.config,
            &self.occupancy,
            pulse.time,
        );
        self.board.refresh(&self.registry, &meta_ctx);

        let selector = SelectionEngine::new(&self.registry);
        let workers: Vec<(WorkerId, Entity)> = self.directory.workers().collect();
        for (id, entity) in workers {
            // Taken out so the task can borrow the world freely.
            let mut manager = match self.world.get::<&mut TaskManager>(entity) {
                Ok(mut slot) => std::mem::take(&mut *slot),
                Err(e) => {
                    log::warn!("{} has no task manager: {}", id, e);
                    continue;
                }
            };
            let mut ctx = TaskContext {
                world: &self.world,
                directory: &self.directory,
                worker: entity,
                pulse: &pulse,
                status: &self.status,
                config: &self.config,
                occupancy: &self.occupancy,
                rng: &mut self.rng,
            };
            let outcome = manager.perform_pulse(&mut ctx, &selector, &mut self.board);
            if let Some(failure) = outcome.failure {
                self.events.push(SimEvent::TaskFailed {
                    worker: id,
                    task: failure.task,
                    error: failure.error,
                });
            }
            if let Ok(mut slot) = self.world.get::<&mut TaskManager>(entity) {
                *slot = manager;
            }
        }

        pulse
    }

    /// Remove a worker. Its current task is ended first so any station slot
    /// it holds is released.
    pub fn remove_worker(&mut self, id: WorkerId) -> bool {
        let Some(entity) = self.directory.remove_worker(id) else {
            return false;
        };
        let manager = self
            .world
            .get::<&mut TaskManager>(entity)
            .map(|mut slot| std::mem::take(&mut *slot));
        if let Ok(mut manager) = manager {
            let pulse = self.idle_pulse();
            let mut ctx = TaskContext {
                world: &self.world,
                directory: &self.directory,
                worker: entity,
                pulse: &pulse,
                status: &self.status,
                config: &self.config,
                occupancy: &self.occupancy,
                rng: &mut self.rng,
            };
            manager.cancel(&mut ctx);
        }
        if let Err(e) = self.world.despawn(entity) {
            log::warn!("Despawn of {} failed: {}", id, e);
        }
        log::info!("Removed worker {}", id);
        self.events.push(SimEvent::WorkerRemoved(id));
        true
    }

    /// Zero-length pulse at the current time, for work done between pulses.
    fn idle_pulse(&self) -> ClockPulse {
        ClockPulse {
            id: 0,
            elapsed: 0.0,
            time: self.clock.time(),
            is_new_sol: false,
            is_new_half_sol: false,
        }
    }

    pub fn time(&self) -> MarsTime {
        self.clock.time()
    }

    pub fn status(&self) -> &SettlementStatus {
        &self.status
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &MetaTaskRegistry {
        &self.registry
    }

    pub fn job_board(&self) -> &JobBoard {
        &self.board
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn worker_entity(&self, id: WorkerId) -> Option<Entity> {
        self.directory.worker(id)
    }

    pub fn building_entity(&self, id: BuildingId) -> Option<Entity> {
        self.directory.building(id)
    }

    pub fn worker_count(&self) -> usize {
        self.directory.worker_count()
    }

    pub fn building_count(&self) -> usize {
        self.directory.building_count()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.directory.workers().map(|(id, _)| id).collect()
    }

    pub fn building_ids(&self) -> Vec<BuildingId> {
        self.directory.buildings().map(|(id, _)| id).collect()
    }

    /// Name and phase of the worker's current task.
    pub fn worker_task(&self, id: WorkerId) -> Option<(String, Option<TaskPhase>)> {
        let entity = self.directory.worker(id)?;
        let manager = self.world.get::<&TaskManager>(entity).ok()?;
        let task = manager.current_task()?;
        Some((task.name().to_string(), task.phase()))
    }

    pub fn activities_today(&self, id: WorkerId) -> Vec<OneActivity> {
        let Some(entity) = self.directory.worker(id) else {
            return Vec::new();
        };
        match self.world.get::<&TaskManager>(entity) {
            Ok(manager) => manager
                .today(self.clock.time())
                .into_iter()
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Every station in the building with its current counts.
    pub fn station_occupancy(&self, id: BuildingId) -> Vec<(FacilityKind, Station)> {
        FacilityKind::ALL
            .iter()
            .filter_map(|kind| station_of(&self.world, &self.directory, id, *kind).map(|s| (*kind, s)))
            .collect()
    }

    /// Workers without a live task.
    pub fn idle_workers(&self) -> Vec<WorkerId> {
        self.directory
            .workers()
            .filter(|(_, e)| {
                self.world
                    .get::<&TaskManager>(*e)
                    .map_or(true, |m| m.is_idle())
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot::capture(&self.world, &self.directory, &self.clock, &self.status)
    }

    /// Replace the current state with a snapshot. The registry and config
    /// stay as they are.
    pub fn restore(&mut self, snapshot: &SimSnapshot) -> Result<(), SnapshotError> {
        let (world, directory) = snapshot.rebuild()?;
        self.world = world;
        self.directory = directory;
        self.clock = snapshot.clock.clone();
        self.status = snapshot.status;
        self.board = JobBoard::new();
        self.occupancy = Occupancy::count(&self.world);
        self.events.clear();
        let salt = self.clock.time().total_millisols().to_bits();
        self.rng = SimRng::seed_from_u64(self.config.seed ^ salt);
        log::info!(
            "Restored {} buildings and {} workers at {}",
            self.directory.building_count(),
            self.directory.worker_count(),
            self.clock.time()
        );
        Ok(())
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

fn pick(ids: &[BuildingId], i: usize) -> Option<BuildingId> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[i % ids.len()])
    }
}
