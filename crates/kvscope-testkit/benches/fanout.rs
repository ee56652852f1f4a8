use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use kvscope::{KvStore, StoreOptions};
use kvscope_testkit::fixtures::{mounted_followers, TestBench};

fn bind_mount_benchmark(c: &mut Criterion) {
    let store = KvStore::new(StoreOptions::shared()).unwrap();

    c.bench_function("bind_mount", |b| {
        b.iter(|| {
            let mut binding = store.bind_with(black_box("key"), 0).unwrap();
            binding.mount();
            binding
        });
    });
}

fn set_benchmark(c: &mut Criterion) {
    let bench = TestBench::with_options(StoreOptions::shared());
    let counter = bench.mounted("count", 0);

    c.bench_function("set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            counter.set(black_box(i)).unwrap();
            i += 1;
        });
    });
}

fn persistent_set_benchmark(c: &mut Criterion) {
    let bench = TestBench::new();
    let counter = bench.mounted("count", 0);

    c.bench_function("persistent_set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            counter.set(black_box(i)).unwrap();
            i += 1;
        });
    });
}

fn fan_out_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for subscriber_count in [1usize, 10, 100].iter() {
        let store = KvStore::new(StoreOptions::shared()).unwrap();
        let owner = {
            let mut binding = store.bind_with("key", 0).unwrap();
            binding.mount();
            binding
        };
        let _followers = mounted_followers(&store, "key", *subscriber_count);

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0u64;
                b.iter(|| {
                    owner.set(black_box(i)).unwrap();
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bind_mount_benchmark,
    set_benchmark,
    persistent_set_benchmark,
    fan_out_benchmark,
);
criterion_main!(benches);
