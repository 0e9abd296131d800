//! Rule evaluation benchmarks
//!
//! Measures the cost the filtering sink adds in front of a sink that does
//! nothing, for typical rule lists.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logsieve_core::{
    matches, truncate, Attr, DiscardSink, FilterRule, FilteredSink, Level, Record, Sink,
};
use std::sync::Arc;

fn api_record() -> Record {
    Record::new(Level::Info, "api")
        .with_attr("method", "POST")
        .with_attr("path", "/v1/items")
        .with_attr("status", 201)
        .with_attr("request_body", "x".repeat(512))
        .with_attr("response_body", "y".repeat(2048))
}

fn rule_list(len: usize) -> Vec<FilterRule> {
    (0..len)
        .map(|i| FilterRule::deny().attribute("path", format!("/never/{}", i)))
        .collect()
}

/// Benchmark a single rule match
fn bench_matches(c: &mut Criterion) {
    let mut group = c.benchmark_group("matches");
    let record = api_record();

    let rule = FilterRule::deny().message("api").attribute("path", "/v1/items");
    group.bench_function("message_and_attribute", |b| {
        b.iter(|| matches(black_box(&record), black_box(&rule)))
    });

    let rule = FilterRule::deny().attribute("status", "201");
    group.bench_function("rendered_number", |b| {
        b.iter(|| matches(black_box(&record), black_box(&rule)))
    });

    group.finish();
}

/// Benchmark truncation of short and long values
fn bench_truncate(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncate");
    let long = "é".repeat(4096);

    group.bench_function("within_limit", |b| {
        b.iter(|| truncate(black_box("short value"), 100))
    });
    group.bench_function("multibyte_4k", |b| {
        b.iter(|| truncate(black_box(&long), 100))
    });

    group.finish();
}

/// Benchmark forwarding through rule lists of growing length
fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");
    let record = api_record();

    for len in [0usize, 4, 16, 64] {
        let sink = FilteredSink::new(Arc::new(DiscardSink), rule_list(len));
        group.bench_with_input(BenchmarkId::new("no_match", len), &sink, |b, sink| {
            b.iter(|| sink.forward(black_box(&record)))
        });
    }

    let shortening = FilteredSink::new(
        Arc::new(DiscardSink),
        vec![FilterRule::shorten(100, ["request_body", "response_body"])],
    );
    group.bench_function("shorten_two_bodies", |b| {
        b.iter(|| shortening.forward(black_box(&record)))
    });

    let derived = shortening.with_attrs(&[Attr::new("id", "client-1")]);
    group.bench_function("derived_shorten", |b| {
        b.iter(|| derived.handle(black_box(&record)))
    });

    group.finish();
}

criterion_group!(benches, bench_matches, bench_truncate, bench_forward);
criterion_main!(benches);
