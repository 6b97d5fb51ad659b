//! Station contention: acquiring and releasing slots at shared facilities.
//!
//! Every capacity-limited facility component embeds a [`Station`]. Tasks
//! refer to a slot by `(BuildingId, FacilityKind)` so they can release it in
//! `clear_down` without holding on to component borrows across pulses.

use std::collections::HashMap;

use hecs::{Entity, World};
use marsbase_logic::facility::{rank_facilities, FacilityCandidate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    Building, BuildingId, Dining, Laboratory, LivingQuarters, Location, Maintenance, RoboticStation,
    Station,
};
use crate::directory::Directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityKind {
    ChargingSlot,
    LabBench,
    Bed,
    DiningSeat,
    Worksite,
}

impl FacilityKind {
    pub const ALL: [FacilityKind; 5] = [
        FacilityKind::ChargingSlot,
        FacilityKind::LabBench,
        FacilityKind::Bed,
        FacilityKind::DiningSeat,
        FacilityKind::Worksite,
    ];
}

/// A component that owns a station.
pub trait Facility: hecs::Component {
    fn station(&self) -> &Station;
    fn station_mut(&mut self) -> &mut Station;
}

impl Facility for RoboticStation {
    fn station(&self) -> &Station {
        &self.slots
    }
    fn station_mut(&mut self) -> &mut Station {
        &mut self.slots
    }
}

impl Facility for Laboratory {
    fn station(&self) -> &Station {
        &self.benches
    }
    fn station_mut(&mut self) -> &mut Station {
        &mut self.benches
    }
}

impl Facility for LivingQuarters {
    fn station(&self) -> &Station {
        &self.beds
    }
    fn station_mut(&mut self) -> &mut Station {
        &mut self.beds
    }
}

impl Facility for Dining {
    fn station(&self) -> &Station {
        &self.seats
    }
    fn station_mut(&mut self) -> &mut Station {
        &mut self.seats
    }
}

impl Facility for Maintenance {
    fn station(&self) -> &Station {
        &self.worksite
    }
    fn station_mut(&mut self) -> &mut Station {
        &mut self.worksite
    }
}

fn modify<T, R, F>(world: &World, entity: Entity, f: F) -> Result<R, hecs::ComponentError>
where
    T: Facility,
    F: FnOnce(&mut Station) -> R,
{
    let mut facility = world.get::<&mut T>(entity)?;
    Ok(f(facility.station_mut()))
}

/// Run `f` against the station of the given facility in a building.
pub fn with_station<R>(
    world: &World,
    entity: Entity,
    kind: FacilityKind,
    f: impl FnOnce(&mut Station) -> R,
) -> Result<R, hecs::ComponentError> {
    match kind {
        FacilityKind::ChargingSlot => modify::<RoboticStation, R, _>(world, entity, f),
        FacilityKind::LabBench => modify::<Laboratory, R, _>(world, entity, f),
        FacilityKind::Bed => modify::<LivingQuarters, R, _>(world, entity, f),
        FacilityKind::DiningSeat => modify::<Dining, R, _>(world, entity, f),
        FacilityKind::Worksite => modify::<Maintenance, R, _>(world, entity, f),
    }
}

/// Copy of a building's station for the given facility, if it has one.
pub fn station_of(
    world: &World,
    directory: &Directory,
    building: BuildingId,
    kind: FacilityKind,
) -> Option<Station> {
    let entity = directory.building(building)?;
    with_station(world, entity, kind, |s| *s).ok()
}

/// Try to take a slot. Refusal is `false`, never an error; an unknown
/// building or missing facility is also a refusal.
pub fn acquire(
    world: &World,
    directory: &Directory,
    building: BuildingId,
    kind: FacilityKind,
) -> bool {
    let Some(entity) = directory.building(building) else {
        log::warn!("Acquire on unknown building {}", building);
        return false;
    };
    with_station(world, entity, kind, Station::acquire).unwrap_or(false)
}

pub fn release(world: &World, directory: &Directory, building: BuildingId, kind: FacilityKind) {
    let Some(entity) = directory.building(building) else {
        log::warn!("Release on unknown building {}", building);
        return;
    };
    if let Err(e) = with_station(world, entity, kind, Station::release) {
        log::warn!("Release of {:?} on {} failed: {}", kind, building, e);
    }
}

fn candidates_of<T: Facility>(world: &World) -> Vec<FacilityCandidate<BuildingId>> {
    world
        .query::<(&Building, &T)>()
        .iter()
        .map(|(_, (building, facility))| FacilityCandidate {
            id: building.id,
            occupied: facility.station().occupied(),
            capacity: facility.station().capacity(),
        })
        .collect()
}

/// Occupancy of every building offering the facility, in building id order.
pub fn candidates(world: &World, kind: FacilityKind) -> Vec<FacilityCandidate<BuildingId>> {
    let mut list = match kind {
        FacilityKind::ChargingSlot => candidates_of::<RoboticStation>(world),
        FacilityKind::LabBench => candidates_of::<Laboratory>(world),
        FacilityKind::Bed => candidates_of::<LivingQuarters>(world),
        FacilityKind::DiningSeat => candidates_of::<Dining>(world),
        FacilityKind::Worksite => candidates_of::<Maintenance>(world),
    };
    list.sort_by_key(|c| c.id);
    list
}

/// Best building with a free slot for the facility: free first, least
/// crowded next, random among equals.
pub fn find_free(world: &World, kind: FacilityKind, rng: &mut impl Rng) -> Option<BuildingId> {
    rank_facilities(&candidates(world, kind), rng)
}

/// Workers per building, counted once per pulse.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    counts: HashMap<BuildingId, u32>,
}

impl Occupancy {
    pub fn count(world: &World) -> Self {
        let mut counts = HashMap::new();
        for (_, loc) in world.query::<&Location>().iter() {
            if let Some(building) = loc.building {
                *counts.entry(building).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    /// Workers located in the building.
    pub fn of(&self, building: BuildingId) -> u32 {
        self.counts.get(&building).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn garage(world: &mut World, dir: &mut Directory, slots: u32) -> BuildingId {
        let id = dir.allocate_building_id();
        let entity = world.spawn((
            Building {
                id,
                name: format!("Garage {}", id.0),
                kind: crate::components::BuildingKind::Garage,
                capacity: 4,
                base_power_load: 1.0,
            },
            RoboticStation {
                slots: Station::new(slots),
            },
        ));
        dir.insert_building(id, entity);
        id
    }

    #[test]
    fn acquire_until_full_then_release() {
        let mut world = World::new();
        let mut dir = Directory::new();
        let g = garage(&mut world, &mut dir, 2);

        assert!(acquire(&world, &dir, g, FacilityKind::ChargingSlot));
        assert!(acquire(&world, &dir, g, FacilityKind::ChargingSlot));
        assert!(!acquire(&world, &dir, g, FacilityKind::ChargingSlot));

        release(&world, &dir, g, FacilityKind::ChargingSlot);
        let station = station_of(&world, &dir, g, FacilityKind::ChargingSlot).unwrap();
        assert_eq!(station.occupied(), 1);
    }

    #[test]
    fn missing_facility_is_refusal() {
        let mut world = World::new();
        let mut dir = Directory::new();
        let g = garage(&mut world, &mut dir, 1);
        assert!(!acquire(&world, &dir, g, FacilityKind::LabBench));
        assert!(!acquire(&world, &dir, BuildingId(99), FacilityKind::ChargingSlot));
    }

    #[test]
    fn occupancy_counts_located_workers() {
        let mut world = World::new();
        let mut dir = Directory::new();
        let g = garage(&mut world, &mut dir, 1);
        world.spawn((Location { building: Some(g) },));
        world.spawn((Location { building: Some(g) },));
        world.spawn((Location { building: None },));

        let occupancy = Occupancy::count(&world);
        assert_eq!(occupancy.of(g), 2);
        assert_eq!(occupancy.of(BuildingId(99)), 0);
    }

    #[test]
    fn find_free_skips_full() {
        let mut world = World::new();
        let mut dir = Directory::new();
        let full = garage(&mut world, &mut dir, 1);
        let open = garage(&mut world, &mut dir, 1);
        assert!(acquire(&world, &dir, full, FacilityKind::ChargingSlot));

        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(find_free(&world, FacilityKind::ChargingSlot, &mut rng), Some(open));
        assert!(acquire(&world, &dir, open, FacilityKind::ChargingSlot));
        assert_eq!(find_free(&world, FacilityKind::ChargingSlot, &mut rng), None);
    }
}
