use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shardcache::ShardedLruCache;

fn bench_cached_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("find_hot", |b| {
        let cache: ShardedLruCache<u64, u64> = ShardedLruCache::with_shards(1000, 4);

        // Warm the cache so every lookup hits.
        for key in 0..1000u64 {
            cache.insert(key, key * 2);
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.find(&(counter % 1000)));
            counter += 1;
        });
    });

    group.bench_function("find_miss", |b| {
        let cache: ShardedLruCache<u64, u64> = ShardedLruCache::with_shards(1000, 4);

        for key in 0..1000u64 {
            cache.insert(key, key * 2);
        }

        let mut counter = 0u64;
        b.iter(|| {
            // Keys outside the resident range guarantee misses.
            black_box(cache.find(&(1_000_000 + counter)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_insert_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_full_cache", |b| {
        let cache: ShardedLruCache<u64, u64> = ShardedLruCache::with_shards(1000, 4);

        for key in 0..1000u64 {
            cache.insert(key, key);
        }

        // Fresh keys keep the cache at capacity, so every insert evicts.
        let mut counter = 1_000u64;
        b.iter(|| {
            black_box(cache.insert(counter, counter));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_find_50_insert", |b| {
        let cache: ShardedLruCache<u64, u64> = ShardedLruCache::with_shards(1000, 4);

        for key in 0..1000u64 {
            cache.insert(key, key);
        }

        let mut counter = 0u64;
        b.iter(|| {
            if counter % 2 == 0 {
                black_box(cache.find(&(counter % 1000)));
            } else {
                black_box(cache.insert(1_000 + counter, counter));
            }
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_find,
    bench_insert_evicting,
    bench_mixed_50_50
);
criterion_main!(benches);
