//! # Fluxone Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Container | cached value, singleton, factory, injected call |
//! | Event bus | emit to 1, 10 and 100 handlers |
//! | Application | `execute_action` through to a store handler |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fluxone_bus::{EventArgs, EventBus, Handler};
use fluxone_container::{Container, Provider};
use fluxone_core::Environment;
use fluxone_runtime::{bootstrap, HELLO_WORLD_ACTION};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Container
// ============================================================================

fn bench_container_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("container");

    let container = Container::new();
    container.register_value("value", Provider::value(42_u64));
    container.register_singleton("singleton", Provider::lazy(|| vec![0_u8; 1024]));
    container.register_factory("factory", Provider::lazy(|| vec![0_u8; 1024]));
    container.register_value("a", Provider::value(1_u64));
    container.register_value("b", Provider::value(2_u64));

    let injected = container
        .inject(["a", "b"], |args| {
            args.cloned::<u64>(0).unwrap_or_default() + args.cloned::<u64>(1).unwrap_or_default()
        })
        .expect("valid dependencies");

    group.bench_function("get_value", |b| b.iter(|| black_box(container.get("value"))));
    group.bench_function("get_singleton", |b| {
        b.iter(|| black_box(container.get("singleton")))
    });
    group.bench_function("get_factory", |b| b.iter(|| black_box(container.get("factory"))));
    group.bench_function("get_missing", |b| b.iter(|| black_box(container.get("missing"))));
    group.bench_function("get_as_typed", |b| {
        b.iter(|| black_box(container.get_as::<u64>("value")))
    });
    group.bench_function("injected_call", |b| b.iter(|| black_box(injected.call_as::<u64>())));

    group.finish();
}

// ============================================================================
// Event bus
// ============================================================================

fn bench_bus_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("event-bus");

    for handlers in [1_usize, 10, 100] {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));
        for _ in 0..handlers {
            let hits = Arc::clone(&hits);
            let handler: Handler = Arc::new(move |_: &EventArgs| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
            bus.on("evt", handler);
        }

        let args: EventArgs = Arc::new(Value::Null);
        group.throughput(Throughput::Elements(handlers as u64));
        group.bench_with_input(BenchmarkId::new("emit", handlers), &handlers, |b, _| {
            b.iter(|| black_box(bus.emit("evt", Arc::clone(&args))))
        });
    }

    group.finish();
}

// ============================================================================
// Application
// ============================================================================

fn bench_action_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("application");
    let app = bootstrap(Environment::Testing).expect("bootstrap");

    group.bench_function("execute_action", |b| {
        b.iter(|| black_box(app.execute_action(HELLO_WORLD_ACTION, Value::Null).is_ok()))
    });
    group.bench_function("save_state", |b| b.iter(|| black_box(app.save_state().is_ok())));

    group.finish();
}

criterion_group!(
    benches,
    bench_container_resolution,
    bench_bus_dispatch,
    bench_action_dispatch,
);

criterion_main!(benches);
