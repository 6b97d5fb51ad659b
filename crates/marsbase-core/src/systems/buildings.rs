//! Building functions - wear, power output, heating and heat load

use hecs::World;
use marsbase_logic::clock::ClockPulse;
use marsbase_logic::energy::{heat_requirement, outside_temperature, sunlight_factor};

use crate::components::{HeatGeneration, HeatLoad, Maintenance, PowerGeneration};

/// Update every building's functions for the pulse.
///
/// Output is scaled by maintenance condition. Heater boosts last until the
/// start of the next sol.
pub fn building_function_system(world: &mut World, pulse: &ClockPulse) {
    for (_, maintenance) in world.query_mut::<&mut Maintenance>() {
        maintenance.wear(pulse.elapsed);
    }

    let millisol = pulse.time.millisol();
    let sun = sunlight_factor(millisol);
    let outside = outside_temperature(millisol);

    for (_, (power, maintenance)) in
        world.query_mut::<(&mut PowerGeneration, Option<&Maintenance>)>()
    {
        let efficiency = maintenance.map_or(1.0, |m| m.efficiency());
        power.current = power
            .sources
            .iter()
            .map(|s| s.kind.current_output(s.max_kw, sun))
            .sum::<f32>()
            * efficiency;
    }

    for (_, (heating, maintenance)) in
        world.query_mut::<(&mut HeatGeneration, Option<&Maintenance>)>()
    {
        if pulse.is_new_sol && heating.boosted {
            heating.boosted = false;
        }
        let efficiency = maintenance.map_or(1.0, |m| m.efficiency());
        let mut output = 0.0;
        let mut draw = 0.0;
        for source in &heating.sources {
            let kw = source.kind.current_output(source.max_kw, sun, heating.boosted) * efficiency;
            output += kw;
            draw += source.kind.power_draw(kw);
        }
        heating.current = output;
        heating.power_draw = draw;
    }

    for (_, load) in world.query_mut::<&mut HeatLoad>() {
        load.current = heat_requirement(load.base_kw, outside);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{HeatSource, PowerSource};
    use marsbase_logic::clock::MarsTime;
    use marsbase_logic::energy::{HeatSourceKind, PowerSourceKind};

    fn pulse_at(millisol: f64, is_new_sol: bool) -> ClockPulse {
        ClockPulse {
            id: 1,
            elapsed: 10.0,
            time: MarsTime::from_sol(2, millisol),
            is_new_sol,
            is_new_half_sol: is_new_sol,
        }
    }

    #[test]
    fn solar_dark_at_night_nuclear_steady() {
        let mut world = World::new();
        let plant = world.spawn((PowerGeneration {
            sources: vec![
                PowerSource {
                    kind: PowerSourceKind::Solar,
                    max_kw: 20.0,
                },
                PowerSource {
                    kind: PowerSourceKind::Nuclear,
                    max_kw: 50.0,
                },
            ],
            current: 0.0,
        },));

        building_function_system(&mut world, &pulse_at(100.0, false));
        assert_eq!(world.get::<&PowerGeneration>(plant).unwrap().current, 50.0);

        building_function_system(&mut world, &pulse_at(500.0, false));
        let noon = world.get::<&PowerGeneration>(plant).unwrap().current;
        assert!((noon - 70.0).abs() < 0.01);
    }

    #[test]
    fn worn_buildings_produce_less() {
        let mut world = World::new();
        let mut maintenance = Maintenance::new(0.0, 60.0);
        maintenance.condition = 0.0;
        let plant = world.spawn((
            PowerGeneration {
                sources: vec![PowerSource {
                    kind: PowerSourceKind::FuelCell,
                    max_kw: 10.0,
                }],
                current: 0.0,
            },
            maintenance,
        ));
        building_function_system(&mut world, &pulse_at(100.0, false));
        assert_eq!(world.get::<&PowerGeneration>(plant).unwrap().current, 5.0);
    }

    #[test]
    fn boost_resets_on_new_sol() {
        let mut world = World::new();
        let hab = world.spawn((
            HeatGeneration {
                sources: vec![HeatSource {
                    kind: HeatSourceKind::ElectricHeater,
                    max_kw: 10.0,
                }],
                boosted: true,
                ..Default::default()
            },
            HeatLoad {
                base_kw: 10.0,
                current: 0.0,
            },
        ));

        building_function_system(&mut world, &pulse_at(300.0, false));
        {
            let heating = world.get::<&HeatGeneration>(hab).unwrap();
            assert_eq!(heating.current, 15.0);
            assert_eq!(heating.power_draw, 15.0);
        }
        assert!(world.get::<&HeatLoad>(hab).unwrap().current > 10.0);

        building_function_system(&mut world, &pulse_at(5.0, true));
        let heating = world.get::<&HeatGeneration>(hab).unwrap();
        assert!(!heating.boosted);
        assert_eq!(heating.current, 10.0);
    }
}
