use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sift_core::config::StrategyWeights;
use sift_core::models::{StrategyHit, StrategyKind};
use sift_retrieval::{fuse_strategies, reciprocal_rank_fusion};

fn bench_fusion(c: &mut Criterion) {
    let lists: Vec<Vec<String>> = (0..4)
        .map(|l| (0..200).map(|i| format!("m{}", (i * (l + 3)) % 500)).collect())
        .collect();
    c.bench_function("rrf_4x200", |b| b.iter(|| reciprocal_rank_fusion(black_box(&lists), 60)));

    let results: Vec<(StrategyKind, Vec<StrategyHit>)> = StrategyKind::ALL
        .iter()
        .map(|kind| {
            let hits = (0..200)
                .map(|i| StrategyHit::new(format!("m{i}"), 1.0 / (i + 1) as f64, "bench"))
                .collect();
            (*kind, hits)
        })
        .collect();
    let weights = StrategyWeights::default();
    c.bench_function("fuse_4x200", |b| {
        b.iter(|| fuse_strategies(black_box(&results), &weights, 50))
    });
}

criterion_group!(benches, bench_fusion);
criterion_main!(benches);
