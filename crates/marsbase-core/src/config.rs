//! Simulation configuration.
//!
//! Loaded once at startup (JSON via serde) and treated as read-only for the
//! run. Every field has a default, so a config file only needs to list what
//! it changes.

use std::path::Path;

use marsbase_logic::constants::{maintenance, scheduler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the engine's random number generator.
    pub seed: u64,
    /// Meta tasks to register, by name. Unknown names are skipped.
    pub meta_tasks: Vec<String>,
    pub scheduler: SchedulerConfig,
    pub robots: RobotConfig,
    pub persons: PersonConfig,
    pub facilities: FacilityConfig,
    pub maintenance: MaintenanceConfig,
    pub base: BaseConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            meta_tasks: crate::meta::BUILTIN_META_TASKS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            scheduler: SchedulerConfig::default(),
            robots: RobotConfig::default(),
            persons: PersonConfig::default(),
            facilities: FacilityConfig::default(),
            maintenance: MaintenanceConfig::default(),
            base: BaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tasks a worker may start within one pulse.
    pub max_tasks_per_pulse: u32,
    pub activity_log_capacity: usize,
    /// Millisols to walk between buildings.
    pub walk_time: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_pulse: scheduler::MAX_TASKS_PER_PULSE,
            activity_log_capacity: scheduler::ACTIVITY_LOG_CAPACITY,
            walk_time: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Battery percent lost per millisol.
    pub drain_rate: f32,
    /// Battery percent gained per millisol at a station.
    pub charge_rate: f32,
    /// Chance to keep charging once above the sufficient level.
    pub continue_charging_chance: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            drain_rate: 0.05,
            charge_rate: 0.5,
            continue_charging_chance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonConfig {
    /// Need growth per millisol.
    pub fatigue_rate: f32,
    pub hunger_rate: f32,
    pub stress_rate: f32,
    /// Durations in millisols and relief per millisol.
    pub sleep_duration: f64,
    pub sleep_relief: f32,
    pub eat_duration: f64,
    /// Time at the counter before the meal starts.
    pub serve_time: f64,
    pub eat_relief: f32,
    pub relax_duration: f64,
    pub relax_relief: f32,
    pub research_duration: f64,
    /// Extra fatigue per millisol of physical or mental work.
    pub work_fatigue: f32,
}

impl Default for PersonConfig {
    fn default() -> Self {
        Self {
            fatigue_rate: 0.001,
            hunger_rate: 0.0025,
            stress_rate: 0.0008,
            sleep_duration: 300.0,
            sleep_relief: 0.004,
            eat_duration: 40.0,
            serve_time: 5.0,
            eat_relief: 0.025,
            relax_duration: 50.0,
            relax_relief: 0.01,
            research_duration: 120.0,
            work_fatigue: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityConfig {
    pub charging_slots: u32,
    pub lab_benches: u32,
    pub beds: u32,
    pub dining_seats: u32,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            charging_slots: 2,
            lab_benches: 3,
            beds: 4,
            dining_seats: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Condition lost per millisol.
    pub wear_rate: f32,
    /// Skill-weighted millisols of work for a full service.
    pub required_work: f64,
    /// Condition below which a building posts a maintenance job.
    pub threshold: f32,
    /// Longest stretch one worker spends on a service before moving on.
    pub shift_length: f64,
    /// Millisols needed to adjust a building's heaters.
    pub heater_adjust_time: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            wear_rate: 0.01,
            required_work: 60.0,
            threshold: maintenance::THRESHOLD,
            shift_length: 150.0,
            heater_adjust_time: 15.0,
        }
    }
}

/// Layout of the generated starting base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    pub habitats: u32,
    pub laboratories: u32,
    pub garages: u32,
    pub canteens: u32,
    pub greenhouses: u32,
    pub power_plants: u32,
    pub persons: u32,
    pub robots: u32,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            habitats: 2,
            laboratories: 1,
            garages: 1,
            canteens: 1,
            greenhouses: 1,
            power_plants: 1,
            persons: 8,
            robots: 4,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the scheduler can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.max_tasks_per_pulse == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.max_tasks_per_pulse must be at least 1".into(),
            ));
        }
        if self.scheduler.activity_log_capacity == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.activity_log_capacity must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.robots.continue_charging_chance) {
            return Err(ConfigError::Invalid(
                "robots.continue_charging_chance must be within 0..=1".into(),
            ));
        }
        if self.robots.charge_rate <= 0.0 {
            return Err(ConfigError::Invalid("robots.charge_rate must be positive".into()));
        }
        if self.maintenance.required_work <= 0.0 {
            return Err(ConfigError::Invalid(
                "maintenance.required_work must be positive".into(),
            ));
        }
        let persons = &self.persons;
        let amounts = [
            ("robots.drain_rate", self.robots.drain_rate as f64),
            ("persons.fatigue_rate", persons.fatigue_rate as f64),
            ("persons.hunger_rate", persons.hunger_rate as f64),
            ("persons.stress_rate", persons.stress_rate as f64),
            ("persons.sleep_duration", persons.sleep_duration),
            ("persons.sleep_relief", persons.sleep_relief as f64),
            ("persons.eat_duration", persons.eat_duration),
            ("persons.serve_time", persons.serve_time),
            ("persons.eat_relief", persons.eat_relief as f64),
            ("persons.relax_duration", persons.relax_duration),
            ("persons.relax_relief", persons.relax_relief as f64),
            ("persons.research_duration", persons.research_duration),
            ("persons.work_fatigue", persons.work_fatigue as f64),
            ("scheduler.walk_time", self.scheduler.walk_time),
            ("maintenance.wear_rate", self.maintenance.wear_rate as f64),
            ("maintenance.shift_length", self.maintenance.shift_length),
            ("maintenance.heater_adjust_time", self.maintenance.heater_adjust_time),
        ];
        if let Some((name, _)) = amounts.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "{} must be a non-negative number",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
