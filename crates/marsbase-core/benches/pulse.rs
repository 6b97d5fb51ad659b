use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marsbase_core::config::SimConfig;
use marsbase_core::engine::SimulationEngine;

fn populated_engine(persons: u32, robots: u32) -> SimulationEngine {
    let mut config = SimConfig::default();
    config.base.habitats = 4;
    config.base.garages = 2;
    config.base.persons = persons;
    config.base.robots = robots;
    let mut engine = SimulationEngine::new(config);
    engine.generate();
    // Warm up so most workers hold a task.
    for _ in 0..20 {
        engine.pulse(5.0);
    }
    engine
}

fn bench_pulse(c: &mut Criterion) {
    let mut engine = populated_engine(40, 16);
    c.bench_function("pulse_56_workers", |b| {
        b.iter(|| black_box(engine.pulse(black_box(2.0))))
    });

    let mut large = populated_engine(200, 60);
    c.bench_function("pulse_260_workers", |b| {
        b.iter(|| black_box(large.pulse(black_box(2.0))))
    });
}

criterion_group!(benches, bench_pulse);
criterion_main!(benches);
