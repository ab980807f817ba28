//! Benchmarks for the sampling hot path.

use criterion::{Criterion, criterion_group, criterion_main};
use powerstage_measurement::{CalibrationTable, MeasurementCell, MeasurementPipeline};
use std::hint::black_box;

fn bench_process(c: &mut Criterion) {
    let mut pipeline = MeasurementPipeline::new(CalibrationTable::default());
    let mut code = 0u16;
    c.bench_function("pipeline_process", |b| {
        b.iter(|| {
            code = (code + 7) & 0x0FFF;
            black_box(pipeline.process(black_box(&[code, 2100, code / 2, 2300])))
        })
    });
}

fn bench_cell(c: &mut Criterion) {
    let mut pipeline = MeasurementPipeline::default();
    let cell = MeasurementCell::default();
    let m = pipeline.process(&[1200, 2100, 900, 2300]);
    c.bench_function("cell_publish_load", |b| {
        b.iter(|| {
            cell.publish(black_box(&m));
            black_box(cell.load())
        })
    });
}

criterion_group!(benches, bench_process, bench_cell);
criterion_main!(benches);
