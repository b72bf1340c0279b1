use std::time::Instant;

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use epistemic_ledger::{
    AssertOptions, BeliefId, ConfidenceInterval, EvidencePointer, EvidenceSourceType,
    TemporalStore, TimeRange, UncertaintyAggregator, UncertaintyLedger,
};

const SEED_COUNT: u32 = 1_000;

fn seeded_store() -> TemporalStore {
    let store = TemporalStore::new();
    let now = Utc::now();
    // Half open-ended, half expiring in the next few hours, spread over 8 namespaces.
    for i in 0..SEED_COUNT {
        let range = if i % 2 == 0 {
            TimeRange::starting_at(now - Duration::hours(1))
        } else {
            TimeRange::new(now - Duration::hours(1), now + Duration::hours(i64::from(i % 5) + 1))
                .unwrap()
        };
        store
            .assert(format!("claim-{i}"), format!("ns-{}", i % 8), range, AssertOptions::new())
            .unwrap();
    }
    store
}

fn seeded_ledger() -> (UncertaintyLedger, Vec<BeliefId>) {
    let ledger = UncertaintyLedger::new();
    let ids = (0..SEED_COUNT)
        .map(|i| {
            let point = f64::from(i % 100) / 100.0;
            ledger
                .assert(
                    format!("belief-{i}"),
                    "bench",
                    vec![],
                    Some(ConfidenceInterval::around(point, 0.1)),
                )
                .unwrap()
                .id
        })
        .collect();
    (ledger, ids)
}

fn bench_temporal_assert(c: &mut Criterion) {
    c.bench_function("temporal/assert", |b| {
        b.iter_custom(|iters| {
            // Fresh store per sample so growth does not leak between samples.
            let store = TemporalStore::new();
            let start = Instant::now();
            for i in 0..iters {
                store
                    .assert(format!("claim-{i}"), "bench", TimeRange::from_now(), AssertOptions::new())
                    .unwrap();
            }
            start.elapsed()
        });
    });
}

fn bench_get_active_at(c: &mut Criterion) {
    let store = seeded_store();
    let at = Utc::now() + Duration::hours(2);

    let mut group = c.benchmark_group("temporal/get_active_at");
    group.throughput(Throughput::Elements(u64::from(SEED_COUNT)));
    group.bench_function("all_namespaces", |b| {
        b.iter(|| black_box(store.get_active_at(at, None).unwrap()));
    });
    group.bench_function("one_namespace", |b| {
        b.iter(|| black_box(store.get_active_at(at, Some("ns-3")).unwrap()));
    });
    group.finish();
}

fn bench_add_evidence(c: &mut Criterion) {
    c.bench_function("uncertainty/add_evidence", |b| {
        b.iter_custom(|iters| {
            let ledger = UncertaintyLedger::new();
            let belief = ledger.assert("bench", "bench", vec![], None).unwrap();
            let start = Instant::now();
            for i in 0..iters {
                let pointer = EvidencePointer::new(
                    "bench",
                    EvidenceSourceType::ToolOutput,
                    i % 3 != 0,
                    0.5,
                );
                ledger.add_evidence(belief.id, pointer).unwrap();
            }
            start.elapsed()
        });
    });
}

fn bench_decay_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncertainty/decay_all");
    group.throughput(Throughput::Elements(u64::from(SEED_COUNT)));
    group.bench_function("seeded", |b| {
        b.iter_custom(|iters| {
            let (ledger, _) = seeded_ledger();
            let mut at = Utc::now();
            let start = Instant::now();
            for _ in 0..iters {
                at += Duration::minutes(1);
                black_box(ledger.decay_all(Some(at)).unwrap());
            }
            start.elapsed()
        });
    });
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let (ledger, ids) = seeded_ledger();
    let agg = UncertaintyAggregator::new(&ledger);

    let mut group = c.benchmark_group("uncertainty/aggregate");
    group.throughput(Throughput::Elements(ids.len() as u64));
    group.bench_function("geometric_mean", |b| {
        b.iter(|| black_box(agg.aggregate(&ids).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_temporal_assert,
    bench_get_active_at,
    bench_add_evidence,
    bench_decay_all,
    bench_aggregate
);
criterion_main!(benches);
