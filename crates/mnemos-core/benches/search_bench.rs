//! Mnemos Search Benchmarks
//!
//! Benchmarks for core search operations using Criterion.
//! Run with: cargo bench -p mnemos-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mnemos_core::embeddings::cosine_similarity;
use mnemos_core::retrieval::{classify_query, exact_match_booster};
use mnemos_core::search::{keyword_overlap_score, LinearIndex, VectorIndex};
use std::collections::HashSet;

fn bench_classify_query(c: &mut Criterion) {
    let queries = [
        "I'm feeling really anxious about the deadline",
        "did I finish my marathon training goal",
        "what did I do yesterday",
        "where do I live",
        "how does the retrieval engine decide which strategy to use",
        "tell me about my weekend",
    ];

    c.bench_function("classify_query", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(classify_query(q));
            }
        })
    });
}

fn bench_keyword_overlap_score(c: &mut Criterion) {
    let query = "where do I live right now";
    let content = "I told you last week that I live in Austin now, after moving from Denver";

    c.bench_function("keyword_overlap_score", |b| {
        b.iter(|| {
            black_box(keyword_overlap_score(query, content));
        })
    });
}

fn bench_exact_match_booster(c: &mut Criterion) {
    c.bench_function("exact_match_booster", |b| {
        b.iter(|| {
            black_box(exact_match_booster(
                "austin texas",
                "I moved to Austin, Texas last spring",
                0.6,
            ));
        })
    });
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a: Vec<f32> = (0..256).map(|i| (i as f32).sin()).collect();
    let b: Vec<f32> = (0..256).map(|i| (i as f32).cos()).collect();

    c.bench_function("cosine_similarity_256d", |b_bench| {
        b_bench.iter(|| {
            black_box(cosine_similarity(&a, &b));
        })
    });
}

fn bench_linear_index_search(c: &mut Criterion) {
    let mut index = LinearIndex::new(256);
    for i in 0..500 {
        let vector: Vec<f32> = (0..256).map(|j| ((i * 256 + j) as f32).sin()).collect();
        index.insert(&format!("node-{i}"), &vector).unwrap();
    }
    let query: Vec<f32> = (0..256).map(|j| (j as f32).cos()).collect();
    let excluded = HashSet::new();

    c.bench_function("linear_index_search_500", |b| {
        b.iter(|| {
            black_box(index.search(&query, 10, 0.0, &excluded).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_classify_query,
    bench_keyword_overlap_score,
    bench_exact_match_booster,
    bench_cosine_similarity,
    bench_linear_index_search,
);
criterion_main!(benches);
