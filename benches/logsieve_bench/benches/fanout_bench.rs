//! Fan-out and formatting benchmarks
//!
//! Measures broadcasting to several sinks and rendering records as text and
//! JSON lines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logsieve_core::testing::FailingSink;
use logsieve_core::{
    Attr, DiscardSink, FanoutSink, JsonFormatter, Level, Log, Logger, Record, RecordFormatter,
    Sink, TextFormatter,
};
use std::sync::Arc;

fn record() -> Record {
    Record::new(Level::Info, "api")
        .with_attr("method", "GET")
        .with_attr("path", "/v1/items")
        .with_attr("status", 200)
        .with_attr("latency", std::time::Duration::from_micros(1830))
}

/// Benchmark broadcasting to a growing number of sinks
fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout");
    let record = record();

    for members in [1usize, 2, 4, 8] {
        let sinks: Vec<Arc<dyn Sink>> = (0..members)
            .map(|_| Arc::new(DiscardSink) as Arc<dyn Sink>)
            .collect();
        let fanout = FanoutSink::new(sinks);
        group.bench_with_input(BenchmarkId::new("members", members), &fanout, |b, fanout| {
            b.iter(|| fanout.handle(black_box(&record)))
        });
    }

    let failing = FanoutSink::new(vec![
        Arc::new(FailingSink::new()),
        Arc::new(DiscardSink),
    ]);
    group.bench_function("with_failing_member", |b| {
        b.iter(|| failing.handle(black_box(&record)))
    });

    group.finish();
}

/// Benchmark line rendering
fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    let record = record();
    let attrs = vec![
        Attr::new("id", "client-1"),
        Attr::group("request", record.attrs.clone()),
    ];

    group.bench_function("text", |b| {
        b.iter(|| TextFormatter.format(black_box(&record), black_box(&attrs)))
    });
    group.bench_function("json", |b| {
        b.iter(|| JsonFormatter.format(black_box(&record), black_box(&attrs)))
    });

    group.finish();
}

/// Benchmark the logger front end when the level is disabled
fn bench_disabled_level(c: &mut Criterion) {
    let logger = Logger::discard();
    c.bench_function("logger_disabled", |b| {
        b.iter(|| logger.debug(black_box("skipped"), &[Attr::new("k", 1)]))
    });
}

criterion_group!(benches, bench_fanout, bench_formatters, bench_disabled_level);
criterion_main!(benches);
