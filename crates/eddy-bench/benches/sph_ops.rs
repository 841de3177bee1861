//! Criterion benchmarks comparing SPH compute providers.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use eddy_bench::reference_dam_break;
use eddy_core::Solver;
use eddy_sph::{ComputeProvider, DirectSumProvider, ParallelGridProvider};

const DT: f64 = 1e-3;

fn providers() -> Vec<Arc<dyn ComputeProvider>> {
    vec![
        Arc::new(DirectSumProvider),
        Arc::new(ParallelGridProvider::new()),
    ]
}

fn bench_dam_break_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("sph_step");
    for n in [4usize, 8] {
        for provider in providers() {
            let name = provider.name().to_string();
            let mut fluid = reference_dam_break(n, provider).unwrap();
            let particles = fluid.particles().len();
            group.bench_with_input(BenchmarkId::new(name, particles), &particles, |b, _| {
                b.iter(|| {
                    fluid.step(black_box(DT)).unwrap();
                });
            });
        }
    }
    group.finish();
}

fn bench_block_creation(c: &mut Criterion) {
    c.bench_function("create_block_16x32x16", |b| {
        b.iter(|| {
            let fluid = reference_dam_break(16, Arc::new(DirectSumProvider)).unwrap();
            black_box(fluid.particles().len());
        });
    });
}

criterion_group!(benches, bench_dam_break_step, bench_block_creation);
criterion_main!(benches);
