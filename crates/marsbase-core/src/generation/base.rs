//! Building specs and the default starting base

use hecs::{EntityBuilder, World};
use marsbase_logic::energy::{HeatSourceKind, PowerSourceKind};
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::{BaseConfig, FacilityConfig, MaintenanceConfig};
use crate::directory::Directory;

/// Everything needed to put a building into the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub name: String,
    pub kind: BuildingKind,
    /// Comfortable occupancy.
    pub capacity: u32,
    pub base_power_load: f32,
    pub power_sources: Vec<PowerSource>,
    pub heat_sources: Vec<HeatSource>,
    /// Heat requirement at -45 °C outside.
    pub heat_load_kw: f32,
    pub charging_slots: u32,
    pub lab_benches: u32,
    pub beds: u32,
    pub dining_seats: u32,
    /// Whether the building wears and needs servicing.
    pub maintained: bool,
}

impl BuildingSpec {
    /// Bare building with no sources or facilities.
    pub fn new(kind: BuildingKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            capacity: 6,
            base_power_load: 1.0,
            power_sources: Vec::new(),
            heat_sources: Vec::new(),
            heat_load_kw: 0.0,
            charging_slots: 0,
            lab_benches: 0,
            beds: 0,
            dining_seats: 0,
            maintained: true,
        }
    }

    /// Stock layout for a building kind.
    pub fn standard(kind: BuildingKind, name: impl Into<String>, facilities: &FacilityConfig) -> Self {
        let electric = |kw| HeatSource {
            kind: HeatSourceKind::ElectricHeater,
            max_kw: kw,
        };
        let mut spec = Self::new(kind, name);
        match kind {
            BuildingKind::Habitat => {
                spec.capacity = 8;
                spec.base_power_load = 3.0;
                spec.beds = facilities.beds;
                spec.heat_sources = vec![electric(12.0)];
                spec.heat_load_kw = 10.0;
            }
            BuildingKind::Laboratory => {
                spec.base_power_load = 5.0;
                spec.lab_benches = facilities.lab_benches;
                spec.heat_sources = vec![electric(8.0)];
                spec.heat_load_kw = 8.0;
            }
            BuildingKind::Garage => {
                spec.base_power_load = 4.0;
                spec.charging_slots = facilities.charging_slots;
                spec.heat_sources = vec![HeatSource {
                    kind: HeatSourceKind::FuelHeater,
                    max_kw: 6.0,
                }];
                spec.heat_load_kw = 6.0;
            }
            BuildingKind::Canteen => {
                spec.capacity = 12;
                spec.base_power_load = 3.0;
                spec.dining_seats = facilities.dining_seats;
                spec.heat_sources = vec![electric(8.0)];
                spec.heat_load_kw = 8.0;
            }
            BuildingKind::Greenhouse => {
                spec.base_power_load = 4.0;
                spec.heat_sources = vec![
                    HeatSource {
                        kind: HeatSourceKind::SolarHeating,
                        max_kw: 10.0,
                    },
                    electric(4.0),
                ];
                spec.heat_load_kw = 10.0;
            }
            BuildingKind::PowerPlant => {
                spec.capacity = 4;
                spec.power_sources = vec![
                    PowerSource {
                        kind: PowerSourceKind::Solar,
                        max_kw: 40.0,
                    },
                    PowerSource {
                        kind: PowerSourceKind::Nuclear,
                        max_kw: 30.0,
                    },
                ];
                spec.heat_sources = vec![HeatSource {
                    kind: HeatSourceKind::FuelHeater,
                    max_kw: 4.0,
                }];
                spec.heat_load_kw = 3.0;
            }
        }
        spec
    }
}

/// Specs for the configured starting base, in spawn order.
pub fn default_base(base: &BaseConfig, facilities: &FacilityConfig) -> Vec<BuildingSpec> {
    let counts = [
        (BuildingKind::Habitat, base.habitats, "Habitat"),
        (BuildingKind::Laboratory, base.laboratories, "Laboratory"),
        (BuildingKind::Garage, base.garages, "Garage"),
        (BuildingKind::Canteen, base.canteens, "Canteen"),
        (BuildingKind::Greenhouse, base.greenhouses, "Greenhouse"),
        (BuildingKind::PowerPlant, base.power_plants, "Power Plant"),
    ];
    let mut specs = Vec::new();
    for (kind, count, label) in counts {
        for i in 1..=count {
            specs.push(BuildingSpec::standard(kind, format!("{} {}", label, i), facilities));
        }
    }
    specs
}

/// Spawn a building from its spec and register it.
pub fn spawn_building(
    world: &mut World,
    directory: &mut Directory,
    spec: &BuildingSpec,
    maintenance: &MaintenanceConfig,
) -> BuildingId {
    let id = directory.allocate_building_id();
    let mut builder = EntityBuilder::new();
    builder.add(Building {
        id,
        name: spec.name.clone(),
        kind: spec.kind,
        capacity: spec.capacity,
        base_power_load: spec.base_power_load,
    });
    builder.add(PowerGeneration {
        sources: spec.power_sources.clone(),
        current: 0.0,
    });
    builder.add(HeatGeneration {
        sources: spec.heat_sources.clone(),
        ..Default::default()
    });
    builder.add(HeatLoad {
        base_kw: spec.heat_load_kw,
        current: 0.0,
    });
    if spec.maintained {
        builder.add(Maintenance::new(maintenance.wear_rate, maintenance.required_work));
    }
    if spec.charging_slots > 0 {
        builder.add(RoboticStation {
            slots: Station::new(spec.charging_slots),
        });
    }
    if spec.lab_benches > 0 {
        builder.add(Laboratory {
            benches: Station::new(spec.lab_benches),
            research_points: 0.0,
        });
    }
    if spec.beds > 0 {
        builder.add(LivingQuarters {
            beds: Station::new(spec.beds),
        });
    }
    if spec.dining_seats > 0 {
        builder.add(Dining {
            seats: Station::new(spec.dining_seats),
        });
    }
    let entity = world.spawn(builder.build());
    directory.insert_building(id, entity);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_matches_config() {
        let specs = default_base(&BaseConfig::default(), &FacilityConfig::default());
        assert_eq!(specs.len(), 7);
        assert_eq!(
            specs.iter().filter(|s| s.kind == BuildingKind::Habitat).count(),
            2
        );
        assert_eq!(specs[0].name, "Habitat 1");
        assert!(specs
            .iter()
            .any(|s| s.kind == BuildingKind::Greenhouse && !s.heat_sources.is_empty()));
    }

    #[test]
    fn spawn_adds_facilities() {
        let mut world = World::new();
        let mut directory = Directory::new();
        let spec = BuildingSpec::standard(
            BuildingKind::Garage,
            "Garage 1",
            &FacilityConfig::default(),
        );
        let id = spawn_building(&mut world, &mut directory, &spec, &MaintenanceConfig::default());

        let entity = directory.building(id).unwrap();
        assert_eq!(world.get::<&RoboticStation>(entity).unwrap().slots.capacity(), 2);
        assert!(world.get::<&Laboratory>(entity).is_err());
        assert!(world.get::<&Maintenance>(entity).is_ok());
    }
}
