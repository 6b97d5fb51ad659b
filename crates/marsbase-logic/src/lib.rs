//! Pure scheduling logic for the Mars base simulation.
//!
//! This crate contains the parts of the task scheduler that don't need an
//! ECS world: the Mars clock, scoring factors, the weighted sampler used to
//! pick among task offers, facility ranking, and power/heat source curves.
//! Functions take plain data and return results, so they are unit-testable
//! without spinning up a settlement.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`clock`] | Millisol time, sols, clock pulses with day-boundary flags |
//! | [`constants`] | Thresholds and limits shared by the scheduler |
//! | [`energy`] | Power and heat source kinds, sunlight and outside temperature |
//! | [`facility`] | Ranking of capacity-limited facilities (free, least crowded, random tie) |
//! | [`scoring`] | Score factors: urgency curves, skill, performance, crowding |
//! | [`selection`] | Weighted random draw over scored candidates |

pub mod clock;
pub mod constants;
pub mod energy;
pub mod facility;
pub mod scoring;
pub mod selection;
