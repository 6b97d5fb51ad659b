//! Component definitions for the ECS simulation.
//!
//! Components are plain data attached to worker and building entities.
//! Behaviour lives in systems and tasks.

mod building;
mod worker;

pub use building::*;
pub use worker::*;
