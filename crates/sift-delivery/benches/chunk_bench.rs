use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sift_delivery::ContentDeliveryAdapter;

fn bench_chunking(c: &mut Criterion) {
    let adapter = ContentDeliveryAdapter::default();
    let text = "A sentence about retrieval fusion. Another about merges.\n\n".repeat(500);

    c.bench_function("chunk_text_2000", |b| {
        b.iter(|| adapter.chunk_text(black_box(&text), 2_000, 200))
    });
    c.bench_function("chunk_for_embedding", |b| {
        b.iter(|| adapter.chunk_for_embedding(black_box(&text)))
    });
}

criterion_group!(benches, bench_chunking);
criterion_main!(benches);
