//! Lookup from stable ids to ECS entities.
//!
//! Ordered maps, so iterating workers always visits them in ascending
//! `WorkerId`. The engine relies on that for a deterministic pulse.

use std::collections::BTreeMap;

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::components::{BuildingId, WorkerId};

#[derive(Debug, Clone, Default)]
pub struct Directory {
    workers: BTreeMap<WorkerId, Entity>,
    buildings: BTreeMap<BuildingId, Entity>,
    next_worker: u32,
    next_building: u32,
}

/// Id counters, kept across snapshot and restore.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IdCounters {
    pub next_worker: u32,
    pub next_building: u32,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_worker_id(&mut self) -> WorkerId {
        self.next_worker += 1;
        WorkerId(self.next_worker)
    }

    pub fn allocate_building_id(&mut self) -> BuildingId {
        self.next_building += 1;
        BuildingId(self.next_building)
    }

    pub fn insert_worker(&mut self, id: WorkerId, entity: Entity) {
        self.next_worker = self.next_worker.max(id.0);
        self.workers.insert(id, entity);
    }

    pub fn insert_building(&mut self, id: BuildingId, entity: Entity) {
        self.next_building = self.next_building.max(id.0);
        self.buildings.insert(id, entity);
    }

    pub fn remove_worker(&mut self, id: WorkerId) -> Option<Entity> {
        self.workers.remove(&id)
    }

    pub fn worker(&self, id: WorkerId) -> Option<Entity> {
        self.workers.get(&id).copied()
    }

    pub fn building(&self, id: BuildingId) -> Option<Entity> {
        self.buildings.get(&id).copied()
    }

    /// Workers in ascending id order.
    pub fn workers(&self) -> impl Iterator<Item = (WorkerId, Entity)> + '_ {
        self.workers.iter().map(|(id, e)| (*id, *e))
    }

    pub fn buildings(&self) -> impl Iterator<Item = (BuildingId, Entity)> + '_ {
        self.buildings.iter().map(|(id, e)| (*id, *e))
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn counters(&self) -> IdCounters {
        IdCounters {
            next_worker: self.next_worker,
            next_building: self.next_building,
        }
    }

    pub fn set_counters(&mut self, counters: IdCounters) {
        self.next_worker = self.next_worker.max(counters.next_worker);
        self.next_building = self.next_building.max(counters.next_building);
    }
}
