//! Benchmarks for the inbound parsing path
//!
//! Measures:
//! - Raw brace scanning over back-to-back frames
//! - Full pipeline ingest (decode, extract, validate, queue) at notification size
//! - Recovery cost on a stream with periodic corruption
//! - Adapter decoding of delivered frames
//!
//! Platform: Cross-platform, synthetic data (CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use perilink::adapters::FrameAdapter;
use perilink::codec::find_frame_end;
use perilink::test_utils::{
    NOTIFICATION_SIZE, corrupted_stream, data_frame, frame_stream, notification_chunks,
};
use perilink::{DynamicFrame, FramePipeline, LinkConfig, TelemetryFrame, ValidatedFrame};
use std::hint::black_box;

fn bench_find_frame_end(c: &mut Criterion) {
    let frame = data_frame(1_000, 3);

    let mut group = c.benchmark_group("find_frame_end");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("data_frame", |b| {
        b.iter(|| black_box(find_frame_end(black_box(&frame), 4096)))
    });
    group.finish();
}

fn bench_pipeline_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_ingest");

    for count in [10usize, 100, 1_000] {
        let stream = frame_stream(count);
        let chunks = notification_chunks(&stream, NOTIFICATION_SIZE);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        group.bench_with_input(BenchmarkId::new("clean", count), &chunks, |b, chunks| {
            b.iter(|| {
                let mut pipeline = FramePipeline::new(&LinkConfig::default());
                let mut delivered = 0;
                for chunk in chunks {
                    pipeline.ingest(chunk);
                    if let Some(batch) = pipeline.flush() {
                        delivered += batch.frames.len();
                    }
                }
                black_box(delivered)
            })
        });
    }

    group.finish();
}

fn bench_corrupted_ingest(c: &mut Criterion) {
    let stream = corrupted_stream(400) + &" ".repeat(5_000);
    let chunks = notification_chunks(&stream, NOTIFICATION_SIZE);

    let mut group = c.benchmark_group("corrupted_ingest");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("every_fourth_frame_intact", |b| {
        b.iter(|| {
            let mut pipeline = FramePipeline::new(&LinkConfig::default());
            for chunk in &chunks {
                pipeline.ingest(chunk);
                black_box(pipeline.flush());
            }
            while pipeline.has_backlog() {
                pipeline.pump();
            }
            black_box(pipeline.stats())
        })
    });
    group.finish();
}

fn bench_adapters(c: &mut Criterion) {
    let frame = ValidatedFrame::new(0, data_frame(1_000, 3));

    let mut group = c.benchmark_group("adapters");
    group.bench_function("telemetry_frame", |b| {
        b.iter(|| black_box(TelemetryFrame::adapt(black_box(&frame))))
    });
    group.bench_function("dynamic_frame", |b| {
        b.iter(|| black_box(DynamicFrame::adapt(black_box(&frame))))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_find_frame_end,
    bench_pipeline_ingest,
    bench_corrupted_ingest,
    bench_adapters
);
criterion_main!(benches);
