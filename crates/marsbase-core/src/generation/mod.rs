//! Generation - building the starting base and its workers

mod base;
mod names;
mod workers;

pub use base::*;
pub use names::*;
pub use workers::*;
