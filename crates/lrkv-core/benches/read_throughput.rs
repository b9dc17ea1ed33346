#![forbid(unsafe_code)]
//! Reader-path and refresh microbenchmarks.
//!
//! - `reader_get_hot`: wait-free read window against a warm map
//! - `writer_get_hot`: the same lookup through the writer's direct read
//! - `refresh_64_ops`: publish cost with a 64-entry op-log, idle readers
//!   registered

use criterion::{Criterion, criterion_group, criterion_main};
use lrkv_core::{Operation, create};
use std::collections::HashMap;
use std::hint::black_box;

struct Put(u64, u64);

impl Operation<HashMap<u64, u64>> for Put {
    type Output = Option<u64>;

    fn apply(&self, target: &mut HashMap<u64, u64>) -> Option<u64> {
        target.insert(self.0, self.1)
    }
}

fn bench_reader_get(c: &mut Criterion) {
    let (factory, mut writer) = create::<HashMap<u64, u64>, Put>(HashMap::new);
    for key in 0..1024 {
        writer.write(Put(key, key * 3));
    }
    writer.refresh();

    let reader = factory.create_reader();
    c.bench_function("reader_get_hot", |b| {
        let mut key = 0_u64;
        b.iter(|| {
            key = (key + 1) % 1024;
            black_box(reader.perform_read(|map| map.get(&key).copied()))
        });
    });

    c.bench_function("writer_get_hot", |b| {
        let mut key = 0_u64;
        b.iter(|| {
            key = (key + 1) % 1024;
            black_box(writer.read(|map| map.get(&key).copied()))
        });
    });
}

fn bench_refresh(c: &mut Criterion) {
    let (factory, mut writer) = create::<HashMap<u64, u64>, Put>(HashMap::new);
    // Registered but idle readers: the snapshot scans them every refresh.
    let _readers: Vec<_> = (0..16).map(|_| factory.create_reader()).collect();

    c.bench_function("refresh_64_ops", |b| {
        let mut round = 0_u64;
        b.iter(|| {
            round += 1;
            for key in 0..64 {
                writer.write(Put(key, round));
            }
            writer.refresh();
        });
    });
}

criterion_group!(benches, bench_reader_get, bench_refresh);
criterion_main!(benches);
