//! Scheduler constants: default thresholds and limits.
//!
//! These are the defaults; the core crate's `SimConfig` can override most of
//! them at startup.

pub mod scheduler {
    /// Replacement tasks a worker may chain into within one pulse.
    pub const MAX_TASKS_PER_PULSE: u32 = 4;
    /// Entries kept in a worker's activity log.
    pub const ACTIVITY_LOG_CAPACITY: usize = 100;
    /// Leftover time below this is treated as used up.
    pub const TIME_EPSILON: f64 = 1e-6;
}

pub mod battery {
    /// Below this a robot starts looking for a charging station.
    pub const RECOMMENDED_LEVEL: f32 = 70.0;
    /// Below this charging becomes urgent.
    pub const CRITICAL_LEVEL: f32 = 20.0;
    /// Above this a charging robot may stop.
    pub const SUFFICIENT_LEVEL: f32 = 80.0;
    pub const FULL_LEVEL: f32 = 100.0;
}

pub mod maintenance {
    /// Condition (0..100) below which a building posts a maintenance job.
    pub const THRESHOLD: f32 = 70.0;
    pub const PRISTINE: f32 = 100.0;
}

pub mod heat {
    /// Heat value above which heating work is worthwhile.
    pub const WORTHWHILE_VALUE: f32 = 1.0;
    /// Change in heat value that counts as a change for observers.
    pub const CHANGE_EPSILON: f32 = 1e-3;
}
