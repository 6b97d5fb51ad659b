//! Systems - per-pulse updates that run before the task managers

mod buildings;
mod needs;

pub use buildings::*;
pub use needs::*;
