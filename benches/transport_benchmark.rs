//! Tracing Transport Benchmarks
//!
//! Measures the overhead the tracing transport adds on top of the inner
//! transport, with and without body inspection.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use estrace::telemetry::{OtelTracer, RecordingTracer};
use estrace::transport::{body, Body, TracingTransport, Transport, TransportError};
use hyper::{Request, Response};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;

const SEARCH_RESPONSE: &str = r#"{"took":3,"_shards":{"total":6},"hits":{"total":274,"hits":[]}}"#;

/// Inner transport answering from memory
struct StaticTransport;

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, _request: Request<Body>) -> Result<Response<Body>, TransportError> {
        Ok(Response::new(body::full(SEARCH_RESPONSE)))
    }
}

fn search_request() -> Request<Body> {
    Request::post("http://localhost:9200/logs/_search?routing=user1")
        .body(body::full(r#"{"query":{"match_all":{}}}"#))
        .unwrap()
}

fn bench_transport(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    // Sampled spans with no processor attached
    let provider = TracerProvider::builder().build();
    let mut group = c.benchmark_group("transport");

    group.bench_function("inner_only", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(StaticTransport.send(search_request()).await) });
    });

    let unsampled = TracingTransport::builder(RecordingTracer::unsampled())
        .round_tripper(StaticTransport)
        .tag_query()
        .build();
    group.bench_function("unsampled", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(unsampled.send(search_request()).await) });
    });

    let tags_only = TracingTransport::builder(OtelTracer::new(provider.tracer("bench")))
        .round_tripper(StaticTransport)
        .whitelist_query_params(["routing"])
        .build();
    group.bench_function("sampled_tags_only", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(tags_only.send(search_request()).await) });
    });

    let inspecting = TracingTransport::builder(OtelTracer::new(provider.tracer("bench")))
        .round_tripper(StaticTransport)
        .whitelist_query_params(["routing"])
        .tag_query()
        .tag_total_hits()
        .tag_total_shards()
        .build();
    group.bench_function("sampled_with_body_inspection", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(inspecting.send(search_request()).await) });
    });

    group.finish();
}

criterion_group!(benches, bench_transport);
criterion_main!(benches);
