//! Segmentation and classification performance benchmarks.
//!
//! Measures the line scan, the per-cell classifier and the full pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csvw_annotator::inference::classify;
use csvw_annotator::structure::segment;
use csvw_annotator::{Annotator, AnnotatorConfig, SourceFile};

/// Generate a testing machine export: a config-style preamble, then a table.
fn generate_export(rows: usize, cols: usize) -> String {
    let mut data = String::new();

    data.push_str("Operator:  Jane Doe\n");
    data.push_str("Date:  2020-01-01\n");
    data.push_str("Test speed:  10 mm/min\n");
    data.push_str("Specimen width:  12,5 mm\n\n");

    let header: Vec<String> = (0..cols).map(|c| format!("Channel {} [kN]", c + 1)).collect();
    data.push_str(&header.join(";"));
    data.push('\n');

    for row in 0..rows {
        let values: Vec<String> = (0..cols)
            .map(|c| format!("{},{}", row % 100, (row * 7 + c) % 1000))
            .collect();
        data.push_str(&values.join(";"));
        data.push('\n');
    }

    data
}

/// Benchmark the line scan with merge and classification.
fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_export(*rows, 8);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| black_box(segment(data)))
        });
    }

    group.finish();
}

/// Benchmark the per-cell classifier on typical cell shapes.
fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let cells = [
        ("int", "20200101"),
        ("float", "12,5"),
        ("bool", "True"),
        ("date", "2020-01-01T12:30:00"),
        ("word", "Operator"),
        ("phrase", "Channel 1 [kN]"),
    ];
    for (name, cell) in cells.iter() {
        group.bench_with_input(BenchmarkId::new("cell", name), cell, |b, cell| {
            b.iter(|| black_box(classify(cell)))
        });
    }

    group.finish();
}

/// Benchmark the full pipeline, encoding detection included.
fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    let annotator = Annotator::default();
    let utf8 = Annotator::default().with_config(AnnotatorConfig::default().with_encoding("utf-8"));

    for rows in [100, 1_000].iter() {
        let source = SourceFile::new("export.csv", generate_export(*rows, 8).into_bytes());

        group.throughput(Throughput::Bytes(source.bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("auto_encoding", rows), &source, |b, source| {
            b.iter(|| black_box(annotator.process(source).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("utf8", rows), &source, |b, source| {
            b.iter(|| black_box(utf8.process(source).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_segment, bench_classify, bench_process);
criterion_main!(benches);
