//! Performance benchmarks for galton

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galton::{aggregate, Experiment, LineageRun, PoissonOffspring};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn benchmark_offspring_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("offspring_sample");

    for lambda in [0.5, 1.0, 1.6].iter() {
        let law = PoissonOffspring::new(*lambda).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        group.bench_with_input(BenchmarkId::new("lambda", lambda), lambda, |b, _| {
            b.iter(|| law.sample(black_box(&mut rng)));
        });
    }

    group.finish();
}

fn benchmark_lineage_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("lineage_run");

    for cap in [100u64, 1000, 10_000].iter() {
        let run = LineageRun::new(1.5, *cap).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        group.bench_with_input(BenchmarkId::new("cap", cap), cap, |b, _| {
            b.iter(|| run.run(black_box(&mut rng)));
        });
    }

    group.finish();
}

fn benchmark_experiment(c: &mut Criterion) {
    let experiment = Experiment::new(vec![1.0, 1.2, 1.4, 1.6], 250, 1000)
        .unwrap()
        .with_seed(42);

    c.bench_function("experiment_4x250", |b| {
        b.iter(|| experiment.run().unwrap());
    });

    let results = experiment.run().unwrap();

    c.bench_function("aggregate_4x250", |b| {
        b.iter(|| aggregate(black_box(&results), 0.95).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_offspring_sample,
    benchmark_lineage_run,
    benchmark_experiment,
);

criterion_main!(benches);
