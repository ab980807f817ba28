//! Benchmarks for timing requests against the simulated timer.

use criterion::{Criterion, criterion_group, criterion_main};
use powerstage_pwm::prelude::*;
use std::hint::black_box;

fn bench_requests(c: &mut Criterion) {
    let Ok(mut engine) = PwmEngine::initialize_waveform(
        SimulatedTimer::new(),
        WaveformSpec::default(),
        PwmLimits::default(),
    ) else {
        return;
    };

    let mut f = 70_000u32;
    c.bench_function("configure_frequency", |b| {
        b.iter(|| {
            f = if f >= 130_000 { 70_000 } else { f + 137 };
            black_box(engine.configure_frequency(black_box(f)))
        })
    });

    let mut tenths = 0u16;
    c.bench_function("set_dead_time_manual", |b| {
        b.iter(|| {
            tenths = (tenths + 1) % 51;
            black_box(engine.set_dead_time_manual(black_box(tenths)))
        })
    });

    c.bench_function("rejected_duty", |b| {
        b.iter(|| black_box(engine.set_duty_cycle_pair_b(black_box(80))))
    });
}

criterion_group!(benches, bench_requests);
criterion_main!(benches);
