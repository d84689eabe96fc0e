//! Batch throughput for both query languages, sequential and on the parallel engine.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use json_query_processor::execution::{ExecutionEngine, ExecutionOptions};
use json_query_processor::types::{Payload, Record};
use json_query_processor::{JsonQueryProcessor, Processor, ProcessorConfig, QueryLanguage};

fn make_batch(len: usize) -> Vec<Record> {
    (0..len)
        .map(|i| {
            let body = format!(
                r#"{{"user":{{"name":"user-{i}","id":{i}}},"items":[{{"price":{}}},{{"price":{}}}]}}"#,
                i as f64 * 0.5,
                (i % 10) as f64 + 0.25
            );
            Record::new(i.to_string(), Payload::raw(body.into_bytes()))
        })
        .collect()
}

fn processor(language: QueryLanguage, query: &str) -> JsonQueryProcessor {
    JsonQueryProcessor::from_config(ProcessorConfig::new(language, query)).expect("bench query compiles")
}

fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    let cases = [
        ("jmespath", processor(QueryLanguage::JmesPath, "user.name")),
        ("jq", processor(QueryLanguage::Jq, ".items | map(.price) | add")),
    ];

    for len in [100usize, 1_000] {
        let batch = make_batch(len);
        group.throughput(Throughput::Elements(len as u64));
        for (name, p) in &cases {
            group.bench_with_input(BenchmarkId::new(*name, len), &batch, |b, batch| {
                b.iter(|| black_box(p.process(batch.clone())));
            });
        }
    }
    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel");
    let len = 20_000usize;
    let batch = make_batch(len);
    group.throughput(Throughput::Elements(len as u64));

    for threads in [1usize, 4] {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            ..Default::default()
        })
        .expect("engine builds");
        let p = processor(QueryLanguage::Jq, ".items | map(.price) | add").with_execution(engine);
        group.bench_with_input(BenchmarkId::new("jq", threads), &batch, |b, batch| {
            b.iter(|| black_box(p.process(batch.clone())));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequential, bench_parallel);
criterion_main!(benches);
