//! Ratio calculator throughput
//!
//! Measures counting and scoring over growing bodies of mixed Arabic/English
//! text, the hot path of every ratio-match evaluation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use switchgen_core::ratio::{compute_ratio, RatioCalculator};
use switchgen_core::types::TargetRatio;

fn mixed_text(sentences: usize) -> Vec<String> {
    (0..sentences)
        .map(|i| format!("كانت المباراة رائعة جدا really great match number {i}, يا صديقي!"))
        .collect()
}

fn bench_compute_ratio(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_ratio");

    for sentences in [1, 16, 256, 4096] {
        let texts = mixed_text(sentences);
        let words: usize = texts.iter().map(|t| t.split_whitespace().count()).sum();
        group.throughput(Throughput::Elements(words as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sentences), &texts, |b, texts| {
            b.iter(|| compute_ratio(black_box(texts), "Arabic", "English"));
        });
    }

    group.finish();
}

fn bench_assess(c: &mut Criterion) {
    let texts = mixed_text(64);
    let target = TargetRatio::new(30.0).expect("valid target");

    c.bench_function("assess_64_sentences", |b| {
        b.iter(|| RatioCalculator::assess(black_box(&texts), "Arabic", "English", target));
    });
}

criterion_group!(benches, bench_compute_ratio, bench_assess);
criterion_main!(benches);
