//! Mars clock: millisol time and the pulses that drive every tick.
//!
//! One sol is 1000 millisols. The simulation advances by pulses; each pulse
//! carries the elapsed millisols and flags marking whether a sol or half-sol
//! boundary was crossed during it.

use serde::{Deserialize, Serialize};

/// Millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// Absolute simulation time, counted in millisols since the start of sol 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MarsTime {
    total: f64,
}

impl MarsTime {
    pub fn from_millisols(total: f64) -> Self {
        Self {
            total: total.max(0.0),
        }
    }

    pub fn from_sol(sol: u32, millisol: f64) -> Self {
        let sol = sol.max(1) as f64 - 1.0;
        Self::from_millisols(sol * MILLISOLS_PER_SOL + millisol.clamp(0.0, MILLISOLS_PER_SOL))
    }

    /// Total millisols since the start of the simulation.
    pub fn total_millisols(&self) -> f64 {
        self.total
    }

    /// Current sol, starting at 1.
    pub fn sol(&self) -> u32 {
        (self.total / MILLISOLS_PER_SOL) as u32 + 1
    }

    /// Millisol within the current sol (0..1000).
    pub fn millisol(&self) -> f64 {
        self.total % MILLISOLS_PER_SOL
    }

    pub fn add(&self, millisols: f64) -> Self {
        Self::from_millisols(self.total + millisols)
    }

    /// Half-sols elapsed since the start; used to detect half-sol crossings.
    fn half_sols(&self) -> u64 {
        (self.total / (MILLISOLS_PER_SOL / 2.0)) as u64
    }
}

impl std::fmt::Display for MarsTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sol {} {:03.0}", self.sol(), self.millisol().floor())
    }
}

/// One discrete advance of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockPulse {
    pub id: u64,
    /// Millisols covered by this pulse.
    pub elapsed: f64,
    /// Time at the end of the pulse.
    pub time: MarsTime,
    pub is_new_sol: bool,
    pub is_new_half_sol: bool,
}

impl ClockPulse {
    /// Time at the start of the pulse.
    pub fn start_time(&self) -> MarsTime {
        MarsTime::from_millisols(self.time.total_millisols() - self.elapsed)
    }
}

/// Source of clock pulses. Owned by the engine; there is no global clock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasterClock {
    time: MarsTime,
    next_pulse_id: u64,
}

impl MasterClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(time: MarsTime) -> Self {
        Self {
            time,
            next_pulse_id: 0,
        }
    }

    pub fn time(&self) -> MarsTime {
        self.time
    }

    /// Advance the clock and produce the pulse describing the advance.
    /// Non-positive or non-finite elapsed time yields an empty pulse.
    pub fn advance(&mut self, elapsed: f64) -> ClockPulse {
        let elapsed = if elapsed.is_finite() && elapsed > 0.0 {
            elapsed
        } else {
            0.0
        };
        let before = self.time;
        self.time = before.add(elapsed);
        self.next_pulse_id += 1;

        let is_new_sol = self.time.sol() != before.sol();
        ClockPulse {
            id: self.next_pulse_id,
            elapsed,
            time: self.time,
            is_new_sol,
            is_new_half_sol: is_new_sol || self.time.half_sols() != before.half_sols(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sol_and_millisol() {
        let t = MarsTime::from_millisols(2_250.0);
        assert_eq!(t.sol(), 3);
        assert!((t.millisol() - 250.0).abs() < 1e-9);
        assert_eq!(MarsTime::default().sol(), 1);
    }

    #[test]
    fn from_sol_round_trips() {
        let t = MarsTime::from_sol(4, 120.0);
        assert_eq!(t.sol(), 4);
        assert!((t.millisol() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn pulse_ids_increase() {
        let mut clock = MasterClock::new();
        let a = clock.advance(1.0);
        let b = clock.advance(1.0);
        assert_eq!(a.id + 1, b.id);
    }

    #[test]
    fn new_sol_flag_on_boundary() {
        let mut clock = MasterClock::starting_at(MarsTime::from_millisols(995.0));
        let pulse = clock.advance(10.0);
        assert!(pulse.is_new_sol);
        assert!(pulse.is_new_half_sol);
        assert_eq!(pulse.time.sol(), 2);

        let pulse = clock.advance(10.0);
        assert!(!pulse.is_new_sol);
        assert!(!pulse.is_new_half_sol);
    }

    #[test]
    fn half_sol_flag_at_midday() {
        let mut clock = MasterClock::starting_at(MarsTime::from_millisols(495.0));
        let pulse = clock.advance(10.0);
        assert!(!pulse.is_new_sol);
        assert!(pulse.is_new_half_sol);
    }

    #[test]
    fn non_positive_elapsed_is_empty_pulse() {
        let mut clock = MasterClock::new();
        let pulse = clock.advance(-3.0);
        assert_eq!(pulse.elapsed, 0.0);
        assert_eq!(clock.time().total_millisols(), 0.0);
        let pulse = clock.advance(f64::NAN);
        assert_eq!(pulse.elapsed, 0.0);
    }

    #[test]
    fn start_time_subtracts_elapsed() {
        let mut clock = MasterClock::new();
        clock.advance(10.0);
        let pulse = clock.advance(5.0);
        assert!((pulse.start_time().total_millisols() - 10.0).abs() < 1e-9);
    }
}
