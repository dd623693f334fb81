use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use envelope_finder::{
    ClauseSet, Coordinate, EnvelopeFinder, EnvelopeWorld, EvidenceEncoder, FinderConfig, InferenceEngine,
    QueryPool, QueryPoolConfig, SensorBand, SensorReading, SplrBackend, StaticFormulaBuilder, StepScript,
    VariableLayout,
};

fn bench_static_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference/static_formula");
    for dim in [5u32, 7, 9] {
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |b, &dim| {
            let layout = VariableLayout::new(dim).unwrap();
            b.iter(|| {
                let mut clauses = ClauseSet::new(Arc::new(SplrBackend));
                StaticFormulaBuilder::new(&layout).build(&mut clauses).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference/scan");
    group.sample_size(10);
    for workers in [1usize, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            let layout = VariableLayout::new(7).unwrap();
            let mut clauses = ClauseSet::new(Arc::new(SplrBackend));
            StaticFormulaBuilder::new(&layout).build(&mut clauses).unwrap();
            // A ring reading leaves several cells for the solver.
            EvidenceEncoder::new(&layout)
                .encode_reading(&mut clauses, Coordinate::new(4, 4), &SensorReading::single(SensorBand::Near))
                .unwrap();
            let pool = QueryPool::start(
                Arc::new(SplrBackend),
                QueryPoolConfig {
                    workers,
                    ..QueryPoolConfig::default()
                },
            )
            .unwrap();
            let engine = InferenceEngine::new(pool);
            b.iter(|| engine.infer(&layout, &clauses).unwrap());
        });
    }
    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference/full_run");
    group.sample_size(10);
    group.bench_function("7x7_four_steps", |b| {
        b.iter(|| {
            let world = EnvelopeWorld::new(7, Coordinate::new(5, 2)).unwrap();
            let mut finder = EnvelopeFinder::new(FinderConfig::for_world(7), world).unwrap();
            finder
                .load_steps(StepScript::parse("1,1 3,3 5,5 7,7", 7).unwrap())
                .unwrap();
            finder.run_all().unwrap()
        });
    });
    group.finish();
}

criterion_group!(inference, bench_static_formula, bench_scan, bench_full_run);
criterion_main!(inference);
