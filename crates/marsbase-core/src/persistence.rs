//! Snapshot and restore of the simulation state.
//!
//! A [`SimSnapshot`] is plain serde data: every building and worker with
//! its components, including each worker's current task and the station
//! occupancy it holds. How the snapshot is stored is up to the caller;
//! JSON helpers are provided for convenience.

use hecs::{EntityBuilder, World};
use marsbase_logic::clock::MasterClock;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::directory::{Directory, IdCounters};
use crate::settlement::SettlementStatus;
use crate::task_manager::TaskManager;

/// Snapshot format version (bump when the layout changes).
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub version: u32,
    pub clock: MasterClock,
    pub status: SettlementStatus,
    pub counters: IdCounters,
    pub buildings: Vec<BuildingRecord>,
    pub workers: Vec<WorkerRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub building: Building,
    pub power: Option<PowerGeneration>,
    pub heating: Option<HeatGeneration>,
    pub heat_load: Option<HeatLoad>,
    pub maintenance: Option<Maintenance>,
    pub robotic_station: Option<RoboticStation>,
    pub laboratory: Option<Laboratory>,
    pub living_quarters: Option<LivingQuarters>,
    pub dining: Option<Dining>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub worker: Worker,
    pub job: Option<Job>,
    pub skills: Skills,
    pub location: Location,
    pub condition: Option<PhysicalCondition>,
    pub battery: Option<Battery>,
    pub tasks: TaskManager,
}

fn cloned<T: hecs::Component + Clone>(entity: hecs::EntityRef<'_>) -> Option<T> {
    entity.get::<&T>().map(|c| (*c).clone())
}

impl SimSnapshot {
    /// Capture buildings and workers in id order.
    pub fn capture(
        world: &World,
        directory: &Directory,
        clock: &MasterClock,
        status: &SettlementStatus,
    ) -> Self {
        let buildings = directory
            .buildings()
            .filter_map(|(_, e)| world.entity(e).ok())
            .filter_map(|e| {
                Some(BuildingRecord {
                    building: cloned::<Building>(e)?,
                    power: cloned(e),
                    heating: cloned(e),
                    heat_load: cloned(e),
                    maintenance: cloned(e),
                    robotic_station: cloned(e),
                    laboratory: cloned(e),
                    living_quarters: cloned(e),
                    dining: cloned(e),
                })
            })
            .collect();
        let workers = directory
            .workers()
            .filter_map(|(_, e)| world.entity(e).ok())
            .filter_map(|e| {
                Some(WorkerRecord {
                    worker: cloned::<Worker>(e)?,
                    job: cloned(e),
                    skills: cloned(e).unwrap_or_default(),
                    location: cloned(e).unwrap_or_default(),
                    condition: cloned(e),
                    battery: cloned(e),
                    tasks: cloned(e).unwrap_or_default(),
                })
            })
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            clock: clock.clone(),
            status: *status,
            counters: directory.counters(),
            buildings,
            workers,
        }
    }

    /// Rebuild a world and directory from the snapshot.
    pub fn rebuild(&self) -> Result<(World, Directory), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: self.version,
            });
        }
        let mut world = World::new();
        let mut directory = Directory::new();

        for record in &self.buildings {
            let mut builder = EntityBuilder::new();
            builder.add(record.building.clone());
            if let Some(c) = &record.power {
                builder.add(c.clone());
            }
            if let Some(c) = &record.heating {
                builder.add(c.clone());
            }
            if let Some(c) = record.heat_load {
                builder.add(c);
            }
            if let Some(c) = record.maintenance {
                builder.add(c);
            }
            if let Some(c) = record.robotic_station {
                builder.add(c);
            }
            if let Some(c) = record.laboratory {
                builder.add(c);
            }
            if let Some(c) = record.living_quarters {
                builder.add(c);
            }
            if let Some(c) = record.dining {
                builder.add(c);
            }
            let entity = world.spawn(builder.build());
            directory.insert_building(record.building.id, entity);
        }

        for record in &self.workers {
            let mut builder = EntityBuilder::new();
            builder
                .add(record.worker.clone())
                .add(record.skills)
                .add(record.location)
                .add(record.tasks.clone());
            if let Some(c) = record.job {
                builder.add(c);
            }
            if let Some(c) = record.condition {
                builder.add(c);
            }
            if let Some(c) = record.battery {
                builder.add(c);
            }
            let entity = world.spawn(builder.build());
            directory.insert_worker(record.worker.id, entity);
        }

        directory.set_counters(self.counters);
        Ok((world, directory))
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Json(e)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Json(e) => write!(f, "Snapshot serialization error: {}", e),
            SnapshotError::VersionMismatch { expected, found } => write!(
                f,
                "Snapshot version mismatch: expected {}, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for SnapshotError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulationEngine;
    use crate::config::SimConfig;

    #[test]
    fn snapshot_round_trip_keeps_tasks_and_stations() {
        let mut engine = SimulationEngine::new(SimConfig::default());
        engine.generate();
        for _ in 0..50 {
            engine.pulse(5.0);
        }

        let json = engine.snapshot().to_json().unwrap();
        let snapshot = SimSnapshot::from_json(&json).unwrap();

        let mut restored = SimulationEngine::new(SimConfig::default());
        restored.restore(&snapshot).unwrap();

        assert_eq!(restored.worker_count(), engine.worker_count());
        assert_eq!(restored.time(), engine.time());
        for id in engine.worker_ids() {
            assert_eq!(
                restored.worker_task(id).map(|(name, _)| name),
                engine.worker_task(id).map(|(name, _)| name)
            );
        }
        for id in engine.building_ids() {
            assert_eq!(
                restored.station_occupancy(id),
                engine.station_occupancy(id)
            );
        }
    }

    #[test]
    fn rejects_other_versions() {
        let mut snapshot = SimulationEngine::new(SimConfig::default()).snapshot();
        snapshot.version = 99;
        let err = snapshot.rebuild().err().expect("rebuild should fail");
        assert!(matches!(
            err,
            SnapshotError::VersionMismatch {
                expected: 1,
                found: 99
            }
        ));
    }
}
