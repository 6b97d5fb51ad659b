//! Worker components: identity, skills, location, condition, battery.
//!
//! Persons and robots are both workers. A worker entity always carries
//! [`Worker`], [`Skills`], [`Location`] and a [`crate::task_manager::TaskManager`];
//! persons add [`PhysicalCondition`] and usually a [`Job`], robots add a
//! [`Battery`].

use marsbase_logic::constants::battery;
use serde::{Deserialize, Serialize};

use super::BuildingId;
use crate::config::PersonConfig;

/// Stable worker identifier, independent of ECS entity handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "W{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub kind: WorkerKind,
}

impl Worker {
    pub fn is_robot(&self) -> bool {
        matches!(self.kind, WorkerKind::Robot(_))
    }

    pub fn robot_type(&self) -> Option<RobotType> {
        match self.kind {
            WorkerKind::Robot(t) => Some(t),
            WorkerKind::Person => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerKind {
    Person,
    Robot(RobotType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotType {
    Repairbot,
    Chefbot,
    Deliverybot,
    Makerbot,
}

/// Assigned job of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job(pub JobType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Engineer,
    Technician,
    Scientist,
    Botanist,
    Doctor,
    Chef,
}

impl JobType {
    pub const ALL: [JobType; 6] = [
        JobType::Engineer,
        JobType::Technician,
        JobType::Scientist,
        JobType::Botanist,
        JobType::Doctor,
        JobType::Chef,
    ];

    /// Jobs that take on building maintenance and heating work.
    pub fn is_mechanical(&self) -> bool {
        matches!(self, JobType::Engineer | JobType::Technician)
    }
}

/// Skill levels in 0..1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Skills {
    pub mechanics: f32,
    pub science: f32,
}

impl Skills {
    /// Random skills with a boost in the job's specialty.
    pub fn random(rng: &mut impl rand::Rng, job: Option<JobType>) -> Self {
        let mut skills = Self {
            mechanics: rng.gen_range(0.0..0.5),
            science: rng.gen_range(0.0..0.5),
        };
        match job {
            Some(JobType::Engineer | JobType::Technician) => {
                skills.mechanics = rng.gen_range(0.6..1.0)
            }
            Some(JobType::Scientist | JobType::Botanist | JobType::Doctor) => {
                skills.science = rng.gen_range(0.6..1.0)
            }
            _ => {}
        }
        skills
    }
}

/// Building the worker is currently in. `None` means out on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub building: Option<BuildingId>,
}

impl Location {
    pub fn in_building(building: BuildingId) -> Self {
        Self {
            building: Some(building),
        }
    }
}

/// Person needs, 0.0 (satisfied) to 1.0 (desperate).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PhysicalCondition {
    pub fatigue: f32,
    pub hunger: f32,
    pub stress: f32,
}

impl PhysicalCondition {
    /// Needs grow with elapsed millisols.
    pub fn grow(&mut self, millisols: f64, rates: &PersonConfig) {
        let m = millisols as f32;
        self.fatigue = (self.fatigue + m * rates.fatigue_rate).clamp(0.0, 1.0);
        self.hunger = (self.hunger + m * rates.hunger_rate).clamp(0.0, 1.0);
        self.stress = (self.stress + m * rates.stress_rate).clamp(0.0, 1.0);
    }

    pub fn relieve(&mut self, need: NeedType, amount: f32) {
        let value = match need {
            NeedType::Fatigue => &mut self.fatigue,
            NeedType::Hunger => &mut self.hunger,
            NeedType::Stress => &mut self.stress,
        };
        *value = (*value - amount).clamp(0.0, 1.0);
    }

    pub fn add(&mut self, need: NeedType, amount: f32) {
        self.relieve(need, -amount);
    }

    pub fn get(&self, need: NeedType) -> f32 {
        match need {
            NeedType::Fatigue => self.fatigue,
            NeedType::Hunger => self.hunger,
            NeedType::Stress => self.stress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedType {
    Fatigue,
    Hunger,
    Stress,
}

/// Robot battery charge, 0..100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Battery {
    pub level: f32,
}

impl Battery {
    pub fn new(level: f32) -> Self {
        Self {
            level: level.clamp(0.0, battery::FULL_LEVEL),
        }
    }

    pub fn drain(&mut self, amount: f32) {
        self.level = (self.level - amount).clamp(0.0, battery::FULL_LEVEL);
    }

    pub fn charge(&mut self, amount: f32) {
        self.level = (self.level + amount).clamp(0.0, battery::FULL_LEVEL);
    }

    pub fn is_full(&self) -> bool {
        self.level >= battery::FULL_LEVEL
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self::new(battery::FULL_LEVEL)
    }
}

/// Work performance rating in 0.1..1.
///
/// Persons lose performance with fatigue and hunger; robots with a draining
/// battery.
pub fn performance_rating(condition: Option<&PhysicalCondition>, battery: Option<&Battery>) -> f32 {
    let rating = match (condition, battery) {
        (Some(c), _) => 1.0 - 0.5 * c.fatigue - 0.25 * c.hunger,
        (None, Some(b)) => (b.level / battery::SUFFICIENT_LEVEL).min(1.0),
        (None, None) => 1.0,
    };
    rating.clamp(0.1, 1.0)
}
