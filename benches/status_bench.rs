use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use omnistat::status::{
    aggregate, build_chain_snapshot, project, BlockRef, ChainId, ChainIndexingStatusSnapshot,
    ChainObservation,
};
use std::collections::{BTreeMap, BTreeSet};

fn following_chain(progress: i64) -> ChainIndexingStatusSnapshot {
    ChainIndexingStatusSnapshot::Following {
        start_block: BlockRef::new(0, 1_600_000_000),
        latest_indexed_block: BlockRef::new(1_000_000, progress),
        latest_safe_block: BlockRef::new(1_000_000, progress),
    }
}

fn chain_set(count: u64) -> (BTreeSet<ChainId>, BTreeMap<ChainId, ChainIndexingStatusSnapshot>) {
    let configured: BTreeSet<ChainId> = (1..=count).collect();
    let chains = configured
        .iter()
        .map(|&id| (id, following_chain(1_700_000_000 + id as i64)))
        .collect();
    (configured, chains)
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for count in [2, 10, 100] {
        let (configured, chains) = chain_set(count);
        group.throughput(Throughput::Elements(count));
        group.bench_function(format!("{}_chains", count), |b| {
            b.iter(|| {
                aggregate(black_box(&configured), black_box(chains.clone())).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_project(c: &mut Criterion) {
    let (configured, chains) = chain_set(10);
    let snapshot = aggregate(&configured, chains).unwrap();

    c.bench_function("project", |b| {
        b.iter(|| {
            project(
                black_box(snapshot.clone()),
                black_box(1_700_000_100),
                black_box(1_700_000_160),
            )
        })
    });
}

fn bench_build_chain_snapshot(c: &mut Criterion) {
    let observation = ChainObservation {
        start_block: BlockRef::new(0, 1_600_000_000),
        end_block: None,
        latest_synced_block: Some(BlockRef::new(1_000_000, 1_700_000_000)),
        latest_indexed_block: Some(BlockRef::new(900_000, 1_699_000_000)),
        latest_safe_block: Some(BlockRef::new(1_000_000, 1_700_000_000)),
        backfill_target_block_count: Some(1_000_000),
    };

    c.bench_function("build_chain_snapshot", |b| {
        b.iter(|| build_chain_snapshot(black_box(1), black_box(&observation)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_aggregate,
    bench_project,
    bench_build_chain_snapshot
);
criterion_main!(benches);
