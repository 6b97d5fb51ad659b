//! Mars base simulation core.
//!
//! Cooperative per-worker task scheduling on top of a `hecs` ECS world.
//! Every clock pulse the engine updates buildings, recomputes settlement
//! power and heat, grows worker needs, and then runs each worker's
//! [`task_manager::TaskManager`] in ascending worker id. Idle workers get a
//! new task from the [`meta::MetaTaskRegistry`] through a weighted random
//! draw; shared facilities are capacity-limited [`components::Station`]s.
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`components`] | Worker and building components |
//! | [`task`] | Phased, resumable tasks |
//! | [`task_manager`] | Per-worker task driving and activity log |
//! | [`meta`] | Meta tasks and their registry |
//! | [`selection`] | Job board and selection engine |
//! | [`facilities`] | Station acquire/release and facility ranking |
//! | [`settlement`] | Power/heat aggregation and events |
//! | [`systems`] | Per-pulse building and worker condition updates |
//! | [`engine`] | The simulation engine |

pub mod components;
pub mod config;
pub mod directory;
pub mod engine;
pub mod facilities;
pub mod generation;
pub mod meta;
pub mod persistence;
pub mod selection;
pub mod settlement;
pub mod systems;
pub mod task;
pub mod task_manager;

/// Random number generator owned by the engine, seeded from the config.
pub type SimRng = rand::rngs::StdRng;

pub use marsbase_logic as logic;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{ConfigError, SimConfig};
    pub use crate::engine::SimulationEngine;
    pub use crate::facilities::FacilityKind;
    pub use crate::generation::BuildingSpec;
    pub use crate::meta::{MetaTask, MetaTaskRegistry};
    pub use crate::settlement::{SettlementStatus, SimEvent};
    pub use crate::task::{Task, TaskError, TaskPhase};
    pub use marsbase_logic::clock::{ClockPulse, MarsTime};
}
