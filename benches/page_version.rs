//! Benchmarks for the page version word.
//!
//! These measure the uncontended cost of the operations that sit on every
//! page access path: the optimistic read handshake and the writer
//! lock/unlock cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pactdb::storage::PageVersion;

fn bench_stable_version(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_version");
    group.throughput(Throughput::Elements(1));

    let version = PageVersion::new_initialized(false, false, true, false, 0);

    group.bench_function("stable_version", |b| {
        b.iter(|| black_box(version.stable_version()))
    });

    group.bench_function("optimistic_read_handshake", |b| {
        b.iter(|| {
            let observed = version.stable_version();
            black_box(version.has_changed(black_box(observed)))
        })
    });

    group.finish();
}

fn bench_lock_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_version_lock");
    group.throughput(Throughput::Elements(1));

    let version = PageVersion::new_initialized(false, false, true, false, 0);

    group.bench_function("lock_unlock_clean", |b| {
        b.iter(|| {
            let guard = version.lock();
            black_box(&guard);
        })
    });

    group.bench_function("lock_insert_unlock", |b| {
        b.iter(|| {
            let mut guard = version.lock();
            guard.set_inserting();
        })
    });

    group.bench_function("try_lock_conditional", |b| {
        b.iter(|| black_box(version.try_lock(0)).is_some())
    });

    group.finish();
}

criterion_group!(benches, bench_stable_version, bench_lock_cycles);
criterion_main!(benches);
