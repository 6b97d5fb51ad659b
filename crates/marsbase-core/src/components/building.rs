//! Building components: the building itself, its capacity-limited
//! facilities, maintenance wear, and power/heat functions.

use marsbase_logic::constants::maintenance;
use marsbase_logic::energy::{HeatSourceKind, PowerSourceKind};
use serde::{Deserialize, Serialize};

/// Stable building identifier, independent of ECS entity handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

impl std::fmt::Display for BuildingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub kind: BuildingKind,
    /// Comfortable occupancy, used for crowding penalties.
    pub capacity: u32,
    /// Baseline electrical load in kW.
    pub base_power_load: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Habitat,
    Laboratory,
    Garage,
    Canteen,
    Greenhouse,
    PowerPlant,
}

/// A capacity-limited slot counter. `occupied <= capacity` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Station {
    capacity: u32,
    occupied: u32,
}

impl Station {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            occupied: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupied(&self) -> u32 {
        self.occupied
    }

    pub fn free(&self) -> u32 {
        self.capacity - self.occupied
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }

    /// Take a slot. Returns `false` (and changes nothing) when full.
    pub fn acquire(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.occupied += 1;
        true
    }

    /// Give a slot back. Releasing an empty station is logged and ignored.
    pub fn release(&mut self) {
        if self.occupied == 0 {
            log::warn!("Station released with no occupied slots (capacity {})", self.capacity);
            return;
        }
        self.occupied -= 1;
    }

    /// Rebuild a station from persisted counts, clamping to capacity.
    pub fn restored(capacity: u32, occupied: u32) -> Self {
        Self {
            capacity,
            occupied: occupied.min(capacity),
        }
    }
}

/// Robot charging slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoboticStation {
    pub slots: Station,
}

/// Lab benches and accumulated research.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Laboratory {
    pub benches: Station,
    pub research_points: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LivingQuarters {
    pub beds: Station,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dining {
    pub seats: Station,
}

/// Wear and maintenance progress. Condition runs 0..100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Maintenance {
    pub condition: f32,
    /// Condition lost per millisol.
    pub wear_rate: f32,
    /// Work accumulated toward the next full service.
    pub effective_work: f64,
    /// Work needed for a full service, in skill-weighted millisols.
    pub required_work: f64,
    /// One worker at a time may service the building.
    pub worksite: Station,
}

impl Maintenance {
    pub fn new(wear_rate: f32, required_work: f64) -> Self {
        Self {
            condition: maintenance::PRISTINE,
            wear_rate,
            effective_work: 0.0,
            required_work,
            worksite: Station::new(1),
        }
    }

    pub fn wear(&mut self, millisols: f64) {
        self.condition = (self.condition - self.wear_rate * millisols as f32).max(0.0);
    }

    pub fn needs_service(&self, threshold: f32) -> bool {
        self.condition < threshold
    }

    /// Output multiplier from wear: 50% when worn out, 100% when pristine.
    pub fn efficiency(&self) -> f32 {
        0.5 + 0.5 * (self.condition / maintenance::PRISTINE).clamp(0.0, 1.0)
    }

    /// Add work; returns true when the service completed.
    pub fn add_work(&mut self, work: f64) -> bool {
        self.effective_work += work.max(0.0);
        if self.effective_work >= self.required_work {
            self.condition = maintenance::PRISTINE;
            self.effective_work = 0.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerSource {
    pub kind: PowerSourceKind,
    pub max_kw: f32,
}

/// Power function: owned sources and this pulse's output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerGeneration {
    pub sources: Vec<PowerSource>,
    pub current: f32,
}

impl PowerGeneration {
    pub fn average_output(&self) -> f32 {
        self.sources
            .iter()
            .map(|s| s.kind.average_output(s.max_kw))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeatSource {
    pub kind: HeatSourceKind,
    pub max_kw: f32,
}

/// Heating function: owned sources, boost setting, this pulse's output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeatGeneration {
    pub sources: Vec<HeatSource>,
    /// Electric heaters run boosted until the next sol.
    pub boosted: bool,
    pub current: f32,
    /// Electrical draw of the heaters this pulse.
    pub power_draw: f32,
}

impl HeatGeneration {
    pub fn has_electric_heater(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.kind == HeatSourceKind::ElectricHeater)
    }
}

/// Heat the building needs to stay habitable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeatLoad {
    /// Requirement in kW at -45 °C outside.
    pub base_kw: f32,
    pub current: f32,
}
