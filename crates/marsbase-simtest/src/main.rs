//! Mars Base Scheduler Harness
//!
//! Drives the simulation engine headless and checks the scheduler's
//! contracts on realistic scenarios: station contention, job claiming,
//! failure isolation and long-run soak invariants.
//!
//! Usage:
//!   cargo run -p marsbase-simtest
//!   cargo run -p marsbase-simtest -- --verbose
//!   cargo run -p marsbase-simtest -- --config base.json

use marsbase_core::config::{BaseConfig, SimConfig};
use marsbase_core::prelude::*;
use marsbase_core::persistence::SimSnapshot;
use marsbase_core::task_manager::TaskManager;
use marsbase_logic::clock::MasterClock;
use marsbase_logic::selection::weighted_pick;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Args {
    verbose: bool,
    config: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        verbose: false,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--config" => args.config = iter.next(),
            other => eprintln!("Ignoring unknown argument {}", other),
        }
    }
    args
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = parse_args();
    let verbose = args.verbose;
    println!("=== Mars Base Scheduler Harness ===\n");

    let config = match &args.config {
        Some(path) => match SimConfig::from_path(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };

    let mut results = Vec::new();

    // 1. Configuration
    results.extend(validate_config(&config, verbose));

    // 2. Clock pulses
    results.extend(validate_clock(verbose));

    // 3. Weighted selection statistics
    results.extend(validate_weighted_selection(verbose));

    // 4. Station contention
    results.extend(validate_station_contention(verbose));

    // 5. Robot charging
    results.extend(validate_charging(verbose));

    // 6. Settlement job claiming
    results.extend(validate_job_claiming(verbose));

    // 7. Failure isolation
    results.extend(validate_failure_isolation(verbose));

    // 8. Long-run soak
    results.extend(validate_soak(&config, verbose));

    // 9. Snapshot round trip
    results.extend(validate_snapshot(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Engine with no generated base and only the named meta tasks.
fn bare_engine(metas: &[&str]) -> SimulationEngine {
    let config = SimConfig {
        meta_tasks: metas.iter().map(|s| s.to_string()).collect(),
        base: BaseConfig {
            habitats: 0,
            laboratories: 0,
            garages: 0,
            canteens: 0,
            greenhouses: 0,
            power_plants: 0,
            persons: 0,
            robots: 0,
        },
        ..SimConfig::default()
    };
    SimulationEngine::new(config)
}

fn occupied(engine: &SimulationEngine, building: BuildingId, kind: FacilityKind) -> u32 {
    engine
        .station_occupancy(building)
        .into_iter()
        .find(|(k, _)| *k == kind)
        .map_or(0, |(_, s)| s.occupied())
}

fn garage(engine: &mut SimulationEngine, slots: u32) -> BuildingId {
    let mut spec = BuildingSpec::new(BuildingKind::Garage, "Garage");
    spec.charging_slots = slots;
    engine.add_building(&spec)
}

fn task_name(engine: &SimulationEngine, id: WorkerId) -> Option<String> {
    engine.worker_task(id).map(|(name, _)| name)
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_config(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    results.push(match config.validate() {
        Ok(()) => TestResult::new("config_valid", true, "loaded config passes validation"),
        Err(e) => TestResult::new("config_valid", false, e.to_string()),
    });

    let engine = SimulationEngine::new(config.clone());
    let registered = engine.registry().len();
    results.push(TestResult::new(
        "meta_tasks_registered",
        registered > 0,
        format!("{} of {} names registered", registered, config.meta_tasks.len()),
    ));

    let broken = SimConfig::from_json_str(r#"{ "scheduler": { "max_tasks_per_pulse": 0 } }"#);
    results.push(TestResult::new(
        "zero_task_cap_rejected",
        broken.is_err(),
        "max_tasks_per_pulse = 0 is refused",
    ));

    let unknown = SimConfig::from_json_str(r#"{ "meta_tasks": ["charge", "terraform"] }"#)
        .map(SimulationEngine::new)
        .map(|e| e.registry().len());
    results.push(TestResult::new(
        "unknown_meta_task_skipped",
        matches!(unknown, Ok(1)),
        format!("registry size {:?}", unknown.ok()),
    ));

    if verbose {
        let names: Vec<&str> = engine.registry().iter().map(|m| m.name()).collect();
        println!("  Meta tasks: {}", names.join(", "));
    }
    results
}

// ── 2. Clock ────────────────────────────────────────────────────────────

fn validate_clock(verbose: bool) -> Vec<TestResult> {
    println!("--- Clock Pulses ---");
    let mut results = Vec::new();

    let mut clock = MasterClock::starting_at(MarsTime::from_sol(1, 990.0));
    let pulse = clock.advance(20.0);
    results.push(TestResult::new(
        "sol_boundary",
        pulse.is_new_sol && pulse.is_new_half_sol && pulse.time.sol() == 2,
        format!("pulse ends at {}", pulse.time),
    ));

    let mut clock = MasterClock::starting_at(MarsTime::from_sol(3, 495.0));
    let pulse = clock.advance(10.0);
    results.push(TestResult::new(
        "half_sol_boundary",
        !pulse.is_new_sol && pulse.is_new_half_sol,
        format!("pulse ends at {}", pulse.time),
    ));

    let before = clock.time();
    let pulse = clock.advance(-5.0);
    results.push(TestResult::new(
        "negative_elapsed_ignored",
        pulse.elapsed == 0.0 && clock.time() == before,
        "time does not run backwards",
    ));

    let mut clock = MasterClock::new();
    let mut sols = 0;
    for _ in 0..1000 {
        if clock.advance(7.3).is_new_sol {
            sols += 1;
        }
    }
    results.push(TestResult::new(
        "sol_count",
        sols == 7,
        format!("{} sols crossed in 7300 millisols", sols),
    ));

    if verbose {
        println!("  Clock at {} after soak", clock.time());
    }
    results
}

// ── 3. Weighted Selection ───────────────────────────────────────────────

fn validate_weighted_selection(verbose: bool) -> Vec<TestResult> {
    println!("--- Weighted Selection ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(7);

    let scores = [1.0_f32, 3.0, 0.0, 6.0];
    let mut counts = [0u32; 4];
    let draws = 20_000;
    for _ in 0..draws {
        if let Some(i) = weighted_pick(&scores, &mut rng) {
            counts[i] += 1;
        }
    }
    let share = |i: usize| counts[i] as f64 / draws as f64;
    results.push(TestResult::new(
        "proportional_draws",
        (share(0) - 0.1).abs() < 0.02 && (share(1) - 0.3).abs() < 0.02 && (share(3) - 0.6).abs() < 0.02,
        format!(
            "shares {:.3} / {:.3} / {:.3} / {:.3}",
            share(0),
            share(1),
            share(2),
            share(3)
        ),
    ));
    results.push(TestResult::new(
        "zero_score_never_drawn",
        counts[2] == 0,
        format!("{} draws of the zero-score entry", counts[2]),
    ));

    let none = weighted_pick(&[0.0, -1.0, f32::NAN], &mut rng);
    results.push(TestResult::new(
        "nothing_positive_is_none",
        none.is_none(),
        "all non-positive scores yield no choice",
    ));

    if verbose {
        println!("  Counts: {:?}", counts);
    }
    results
}

// ── 4. Station Contention ───────────────────────────────────────────────

fn validate_station_contention(verbose: bool) -> Vec<TestResult> {
    println!("--- Station Contention ---");
    let mut results = Vec::new();

    let mut engine = bare_engine(&["charge"]);
    let g = garage(&mut engine, 2);
    let robots: Vec<WorkerId> = (0..5)
        .map(|i| engine.spawn_robot(&format!("Unit {}", i), RobotType::Deliverybot, 20.0, Some(g)))
        .collect();
    engine.pulse(1.0);

    let charging = robots
        .iter()
        .filter(|id| task_name(&engine, **id).as_deref() == Some("Charge"))
        .count();
    results.push(TestResult::new(
        "capacity_respected",
        charging == 2 && occupied(&engine, g, FacilityKind::ChargingSlot) == 2,
        format!("{} robots charging at a 2-slot garage", charging),
    ));
    results.push(TestResult::new(
        "rest_stay_idle",
        engine.idle_workers().len() == 3,
        format!("{} idle", engine.idle_workers().len()),
    ));

    for id in &robots {
        engine.remove_worker(*id);
    }
    let left = occupied(&engine, g, FacilityKind::ChargingSlot);
    results.push(TestResult::new(
        "removal_releases_slots",
        left == 0,
        format!("{} slots held after removing every robot", left),
    ));

    if verbose {
        println!("  Events: {:?}", engine.drain_events());
    }
    results
}

// ── 5. Charging ─────────────────────────────────────────────────────────

fn validate_charging(verbose: bool) -> Vec<TestResult> {
    println!("--- Robot Charging ---");
    let mut results = Vec::new();

    let mut engine = bare_engine(&["charge"]);
    let g = garage(&mut engine, 1);
    let robot = engine.spawn_robot("Sparky", RobotType::Makerbot, 40.0, Some(g));

    engine.pulse(1.0);
    results.push(TestResult::new(
        "low_robot_charges",
        engine.worker_task(robot) == Some(("Charge".to_string(), Some(TaskPhase::Charging))),
        format!("task {:?}", engine.worker_task(robot)),
    ));

    let mut pulses = 0;
    while engine.worker_task(robot).is_some() && pulses < 1000 {
        engine.pulse(1.0);
        pulses += 1;
    }
    let level = engine
        .worker_entity(robot)
        .and_then(|e| engine.world().get::<&Battery>(e).ok().map(|b| b.level))
        .unwrap_or(0.0);
    results.push(TestResult::new(
        "charge_completes",
        engine.worker_task(robot).is_none() && level >= 80.0,
        format!("battery {:.1} after {} pulses", level, pulses),
    ));
    results.push(TestResult::new(
        "slot_released",
        occupied(&engine, g, FacilityKind::ChargingSlot) == 0,
        "charging slot free after the task ends",
    ));

    if verbose {
        for activity in engine.activities_today(robot) {
            println!(
                "  {} {} {:?}",
                activity.start, activity.task_name, activity.phase
            );
        }
    }
    results
}

// ── 6. Job Claiming ─────────────────────────────────────────────────────

fn validate_job_claiming(verbose: bool) -> Vec<TestResult> {
    println!("--- Settlement Job Claiming ---");
    let mut results = Vec::new();

    let mut engine = bare_engine(&["maintenance"]);
    let hab = engine.add_building(&BuildingSpec::new(BuildingKind::Habitat, "Hab"));
    if let Some(entity) = engine.building_entity(hab) {
        if let Ok(mut m) = engine.world_mut().get::<&mut Maintenance>(entity) {
            m.condition = 35.0;
        }
    }
    let bots: Vec<WorkerId> = (0..3)
        .map(|i| engine.spawn_robot(&format!("Fixer {}", i), RobotType::Repairbot, 100.0, Some(hab)))
        .collect();
    engine.pulse(1.0);

    let maintaining: Vec<WorkerId> = bots
        .iter()
        .copied()
        .filter(|id| task_name(&engine, *id).as_deref() == Some("Maintain"))
        .collect();
    results.push(TestResult::new(
        "single_claim",
        maintaining.len() == 1,
        format!("{} workers maintaining one building", maintaining.len()),
    ));
    results.push(TestResult::new(
        "lowest_id_wins",
        maintaining.first() == bots.first(),
        format!("claimed by {:?}", maintaining.first()),
    ));
    results.push(TestResult::new(
        "board_emptied",
        engine.job_board().available_count() == 0,
        format!("{} jobs left on the board", engine.job_board().available_count()),
    ));

    let mut pulses = 0;
    while maintaining
        .first()
        .is_some_and(|id| engine.worker_task(*id).is_some())
        && pulses < 2000
    {
        engine.pulse(5.0);
        pulses += 1;
    }
    let condition = engine
        .building_entity(hab)
        .and_then(|e| engine.world().get::<&Maintenance>(e).ok().map(|m| m.condition))
        .unwrap_or(0.0);
    results.push(TestResult::new(
        "service_restores_condition",
        condition > 35.0,
        format!("condition {:.1} after {} pulses", condition, pulses),
    ));

    if verbose {
        println!("  Worksite occupancy: {}", occupied(&engine, hab, FacilityKind::Worksite));
    }
    results
}

// ── 7. Failure Isolation ────────────────────────────────────────────────

fn validate_failure_isolation(verbose: bool) -> Vec<TestResult> {
    println!("--- Failure Isolation ---");
    let mut results = Vec::new();

    let mut engine = bare_engine(&["charge"]);
    let g = garage(&mut engine, 2);
    let broken = engine.spawn_robot("Broken", RobotType::Chefbot, 30.0, Some(g));
    let healthy = engine.spawn_robot("Healthy", RobotType::Chefbot, 30.0, Some(g));
    engine.pulse(1.0);
    engine.drain_events();

    if let Some(entity) = engine.worker_entity(broken) {
        let _ = engine.world_mut().remove_one::<Battery>(entity);
    }
    engine.pulse(1.0);
    let events = engine.drain_events();

    let reported = events.iter().any(|e| {
        matches!(e, SimEvent::TaskFailed { worker, .. } if *worker == broken)
    });
    results.push(TestResult::new(
        "failure_reported",
        reported,
        format!("{} events", events.len()),
    ));
    results.push(TestResult::new(
        "failed_task_ended",
        engine.worker_task(broken).is_none() && occupied(&engine, g, FacilityKind::ChargingSlot) == 1,
        "broken robot idle and its slot released",
    ));
    results.push(TestResult::new(
        "others_unaffected",
        task_name(&engine, healthy).as_deref() == Some("Charge"),
        format!("healthy robot task {:?}", task_name(&engine, healthy)),
    ));

    if verbose {
        for event in &events {
            println!("  {:?}", event);
        }
    }
    results
}

// ── 8. Soak ─────────────────────────────────────────────────────────────

fn validate_soak(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Long-Run Soak ---");
    let mut results = Vec::new();

    let mut engine = SimulationEngine::new(config.clone());
    engine.generate();

    let mut overbooked = 0;
    let mut done_tasks = 0;
    let mut failures = 0;
    let mut heat_changes = 0;
    let mut sols = 0;
    let pulses = 2000;
    for _ in 0..pulses {
        engine.pulse(5.0);
        for (_, manager) in engine.world().query::<&TaskManager>().iter() {
            if manager.current_task().is_some_and(|t| t.is_done()) {
                done_tasks += 1;
            }
        }
        for id in engine.building_ids() {
            for (_, station) in engine.station_occupancy(id) {
                if station.occupied() > station.capacity() {
                    overbooked += 1;
                }
            }
        }
        for event in engine.drain_events() {
            match event {
                SimEvent::TaskFailed { .. } => failures += 1,
                SimEvent::HeatValueChanged { .. } => heat_changes += 1,
                SimEvent::NewSol(_) => sols += 1,
                SimEvent::WorkerRemoved(_) => {}
            }
        }
    }

    results.push(TestResult::new(
        "no_overbooking",
        overbooked == 0,
        format!("{} overbooked stations seen", overbooked),
    ));
    results.push(TestResult::new(
        "no_finished_task_retained",
        done_tasks == 0,
        format!("{} finished tasks left in place", done_tasks),
    ));
    results.push(TestResult::new(
        "no_task_failures",
        failures == 0,
        format!("{} failures", failures),
    ));
    results.push(TestResult::new(
        "sols_elapsed",
        sols == 10,
        format!("{} new sols at {}", sols, engine.time()),
    ));

    for id in engine.worker_ids() {
        engine.remove_worker(id);
    }
    let held: u32 = engine
        .building_ids()
        .into_iter()
        .flat_map(|id| engine.station_occupancy(id))
        .map(|(_, s)| s.occupied())
        .sum();
    results.push(TestResult::new(
        "all_stations_released",
        held == 0,
        format!("{} slots held after removing all workers", held),
    ));

    if verbose {
        let status = engine.status();
        println!(
            "  Power {:.1}/{:.1} kW, heat value {:.3}, {} heat changes",
            status.power_generated, status.power_required, status.heat_value, heat_changes
        );
    }
    results
}

// ── 9. Snapshot ─────────────────────────────────────────────────────────

fn validate_snapshot(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Snapshot Round Trip ---");
    let mut results = Vec::new();

    let mut engine = SimulationEngine::new(config.clone());
    engine.generate();
    for _ in 0..100 {
        engine.pulse(5.0);
    }

    let json = match engine.snapshot().to_json() {
        Ok(j) => j,
        Err(e) => {
            results.push(TestResult::new("snapshot_serialize", false, e.to_string()));
            return results;
        }
    };
    let mut restored = SimulationEngine::new(config.clone());
    let outcome = SimSnapshot::from_json(&json).and_then(|s| restored.restore(&s));
    if let Err(e) = outcome {
        results.push(TestResult::new("snapshot_restore", false, e.to_string()));
        return results;
    }

    let tasks_match = engine
        .worker_ids()
        .into_iter()
        .all(|id| task_name(&engine, id) == task_name(&restored, id));
    results.push(TestResult::new(
        "tasks_restored",
        restored.worker_count() == engine.worker_count() && tasks_match,
        format!("{} workers restored", restored.worker_count()),
    ));

    let stations_match = engine
        .building_ids()
        .into_iter()
        .all(|id| engine.station_occupancy(id) == restored.station_occupancy(id));
    results.push(TestResult::new(
        "stations_restored",
        stations_match,
        "station occupancy matches the captured engine",
    ));

    for _ in 0..100 {
        restored.pulse(5.0);
    }
    results.push(TestResult::new(
        "restored_engine_runs",
        restored.time() > engine.time(),
        format!("restored engine reached {}", restored.time()),
    ));

    if verbose {
        println!("  Snapshot size: {} bytes", json.len());
    }
    results
}
