//! Benchmarks for the hot paths called on every `recall`: vector
//! similarity/quantization and ANN search. Run with `cargo bench -p
//! memonic-core`.

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memonic_core::index::AnnIndex;
use memonic_core::memory::NodeKind;
use memonic_core::vector::Vector;
use memonic_core::{Config, MemoryEngine};

const DIM: usize = 384;

fn sample_vector(seed: u32) -> Vector {
    Vector((0..DIM).map(|i| ((i as f32 + seed as f32) * 0.37).sin()).collect())
}

fn bench_cosine(c: &mut Criterion) {
    let a = sample_vector(1).normalize();
    let b = sample_vector(2).normalize();
    c.bench_function("vector_cosine_384d", |bencher| {
        bencher.iter(|| black_box(a.cosine(&b)))
    });
}

fn bench_quantize_roundtrip(c: &mut Criterion) {
    let v = sample_vector(3).normalize();
    c.bench_function("vector_quantize_roundtrip_384d", |bencher| {
        bencher.iter(|| {
            let q = v.quantize();
            black_box(q.to_float())
        })
    });
}

fn bench_approx_cosine(c: &mut Criterion) {
    let a = sample_vector(4).normalize().quantize();
    let b = sample_vector(5).normalize().quantize();
    c.bench_function("vector_approx_cosine_384d", |bencher| {
        bencher.iter(|| black_box(a.approx_cosine(&b)))
    });
}

fn bench_ann_search(c: &mut Criterion) {
    let mut index = AnnIndex::new(DIM).expect("ann index");
    for i in 0..2_000u32 {
        let id = memonic_core::NodeId::new();
        index.add(id, &sample_vector(i)).expect("add");
    }
    let query = sample_vector(999);
    c.bench_function("ann_search_top10_of_2000", |bencher| {
        bencher.iter(|| black_box(index.search(&query, 10).expect("search")))
    });
}

fn bench_recall_pipeline(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.store_path = dir.path().join("bench-store");
    let engine = MemoryEngine::open_without_embeddings(config, DIM).expect("engine");

    for i in 0..200 {
        engine
            .remember(
                NodeKind::Episode,
                format!("benchmark memory number {i} about testing and retrieval"),
                Some(sample_vector(i as u32)),
                HashSet::new(),
                None,
            )
            .expect("remember");
    }

    c.bench_function("recall_hybrid_limit10_of_200", |bencher| {
        bencher.iter(|| {
            black_box(
                engine
                    .recall(
                        "testing retrieval",
                        10,
                        0.0,
                        memonic_core::SearchMode::Hybrid,
                        memonic_core::Zoom::Normal,
                        None,
                        false,
                        false,
                        false,
                    )
                    .expect("recall"),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_cosine,
    bench_quantize_roundtrip,
    bench_approx_cosine,
    bench_ann_search,
    bench_recall_pipeline,
);
criterion_main!(benches);
