//! Criterion benchmarks for the I2C queue and the job scheduler.
//!
//! Run: cargo bench -p firmware --bench i2c_queue
//!
//! Results show:
//!   enqueue_complete/*   enqueue + completion-handler cost per transfer
//!   chained_burst_16     one burst of queued transfers drained by chaining
//!   scheduler_run/*      cost of one `run()` call with k RunRun jobs

#![allow(
    clippy::unwrap_used,              // benchmark helpers use unwrap for brevity
    clippy::expect_used,
    clippy::panic,
    missing_docs,                     // criterion_group! macro generates undocumented items
)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use firmware::{I2cEngine, I2cRequest, JobControl, JobScheduler, Phase};
use platform::mocks::MockI2c;
use platform::{I2cAddress, I2cConfig, TransferLen};

const ACCEL: I2cAddress = I2cAddress::new(0x18);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine() -> I2cEngine<MockI2c, 16, 16> {
    let engine = I2cEngine::new(MockI2c::new().with_device(ACCEL));
    engine.init(I2cConfig::default()).unwrap();
    engine
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_enqueue_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_complete");
    for len in [1usize, 6, 32] {
        let engine = engine();
        let id = engine
            .register(I2cRequest::read(ACCEL, 0x28, TransferLen::new(len).unwrap()))
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                engine.enqueue(id).unwrap();
                black_box(engine.on_transfer_complete());
                engine.process_one().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_chained_burst(c: &mut Criterion) {
    let engine = engine();
    let ids: Vec<_> = (0..16u8)
        .map(|r| {
            engine
                .register(I2cRequest::read(ACCEL, r, TransferLen::ONE))
                .unwrap()
        })
        .collect();
    c.bench_function("chained_burst_16", |b| {
        b.iter(|| {
            for &id in &ids {
                engine.enqueue(id).unwrap();
            }
            while engine.on_transfer_complete().is_some() {}
            engine.process_one().unwrap();
        });
    });
}

fn bench_scheduler_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_run");
    for k in [1usize, 4, 16] {
        let mut jobs: Vec<_> = (0..k)
            .map(|_| {
                |ctl: &JobControl| {
                    black_box(ctl.phase());
                }
            })
            .collect();
        let mut sched = JobScheduler::<16>::new();
        for job in &mut jobs {
            sched.job_add(job, Phase::RunRun).unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, _| {
            b.iter(|| sched.run());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue_complete,
    bench_chained_burst,
    bench_scheduler_run
);
criterion_main!(benches);
