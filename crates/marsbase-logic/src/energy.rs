//! Power and heat source kinds and the environment curves that drive them.
//!
//! Each source kind is a capability: given its rated maximum and the current
//! sunlight, it reports an instantaneous output, and it can report its
//! long-run average for planning. Buildings sum these every pulse.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Fraction of peak sunlight at a given millisol (0 at night, 1 at noon).
/// Daylight runs from millisol 250 to 750.
pub fn sunlight_factor(millisol: f64) -> f32 {
    let m = millisol.rem_euclid(1000.0);
    if !(250.0..=750.0).contains(&m) {
        return 0.0;
    }
    ((m - 250.0) / 500.0 * PI).sin().max(0.0) as f32
}

/// Outside temperature in °C at a given millisol: about -80 before dawn,
/// about -10 in mid-afternoon.
pub fn outside_temperature(millisol: f64) -> f32 {
    let m = millisol.rem_euclid(1000.0);
    // Coldest at millisol 200, warmest at 700.
    let phase = (m - 200.0) / 1000.0 * 2.0 * PI;
    (-45.0 - 35.0 * phase.cos()) as f32
}

/// Heat a building needs given its base requirement and outside temperature.
/// The base requirement is rated at -45 °C.
pub fn heat_requirement(base_kw: f32, outside_c: f32) -> f32 {
    let indoor = 22.0;
    let rated_delta = indoor - (-45.0);
    (base_kw * (indoor - outside_c) / rated_delta).max(0.0)
}

/// Settlement heat value: demand over supply. Above 1.0 heating work pays off.
pub fn heat_value(demand: f32, supply: f32) -> f32 {
    demand.max(0.0) / (supply.max(0.0) + 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerSourceKind {
    Solar,
    Wind,
    FuelCell,
    Nuclear,
}

impl PowerSourceKind {
    /// Instantaneous output in kW.
    pub fn current_output(&self, max_kw: f32, sunlight: f32) -> f32 {
        match self {
            PowerSourceKind::Solar => max_kw * sunlight.clamp(0.0, 1.0),
            PowerSourceKind::Wind => max_kw * 0.3,
            PowerSourceKind::FuelCell => max_kw,
            PowerSourceKind::Nuclear => max_kw,
        }
    }

    /// Average output over a sol in kW.
    pub fn average_output(&self, max_kw: f32) -> f32 {
        match self {
            // Half the sol is dark; the lit half averages 2/π of peak.
            PowerSourceKind::Solar => max_kw * 0.5 * (2.0 / PI as f32),
            PowerSourceKind::Wind => max_kw * 0.3,
            PowerSourceKind::FuelCell => max_kw,
            PowerSourceKind::Nuclear => max_kw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeatSourceKind {
    ElectricHeater,
    SolarHeating,
    FuelHeater,
}

impl HeatSourceKind {
    /// Instantaneous output in kW. Boosted electric heaters run at 150%.
    pub fn current_output(&self, max_kw: f32, sunlight: f32, boosted: bool) -> f32 {
        match self {
            HeatSourceKind::ElectricHeater => {
                if boosted {
                    max_kw * 1.5
                } else {
                    max_kw
                }
            }
            HeatSourceKind::SolarHeating => max_kw * sunlight.clamp(0.0, 1.0),
            HeatSourceKind::FuelHeater => max_kw,
        }
    }

    pub fn average_output(&self, max_kw: f32) -> f32 {
        match self {
            HeatSourceKind::ElectricHeater | HeatSourceKind::FuelHeater => max_kw,
            HeatSourceKind::SolarHeating => max_kw * 0.5 * (2.0 / PI as f32),
        }
    }

    /// Electrical draw of the heater in kW.
    pub fn power_draw(&self, output_kw: f32) -> f32 {
        match self {
            HeatSourceKind::ElectricHeater => output_kw,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunlight_peaks_at_noon() {
        assert_eq!(sunlight_factor(100.0), 0.0);
        assert_eq!(sunlight_factor(900.0), 0.0);
        assert!((sunlight_factor(500.0) - 1.0).abs() < 1e-4);
        assert!(sunlight_factor(300.0) < sunlight_factor(450.0));
    }

    #[test]
    fn temperature_range() {
        let coldest = outside_temperature(200.0);
        let warmest = outside_temperature(700.0);
        assert!((coldest - -80.0).abs() < 0.1);
        assert!((warmest - -10.0).abs() < 0.1);
    }

    #[test]
    fn colder_needs_more_heat() {
        let cold = heat_requirement(10.0, -80.0);
        let mild = heat_requirement(10.0, -10.0);
        assert!(cold > mild);
        assert!((heat_requirement(10.0, -45.0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn heat_value_formula() {
        assert!((heat_value(10.0, 4.0) - 2.0).abs() < 1e-6);
        assert_eq!(heat_value(0.0, 0.0), 0.0);
    }

    #[test]
    fn solar_tracks_sun() {
        assert_eq!(PowerSourceKind::Solar.current_output(20.0, 0.0), 0.0);
        assert!((PowerSourceKind::Solar.current_output(20.0, 0.5) - 10.0).abs() < 1e-6);
        assert_eq!(PowerSourceKind::Nuclear.current_output(50.0, 0.0), 50.0);
        assert!(PowerSourceKind::Solar.average_output(20.0) < 20.0);
    }

    #[test]
    fn boosted_heater() {
        let normal = HeatSourceKind::ElectricHeater.current_output(10.0, 0.0, false);
        let boosted = HeatSourceKind::ElectricHeater.current_output(10.0, 0.0, true);
        assert!(boosted > normal);
        assert_eq!(HeatSourceKind::FuelHeater.power_draw(8.0), 0.0);
    }
}
