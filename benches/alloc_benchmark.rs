use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use palloc::{Arena, Pool};

fn bench_arena_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_batch_1000");
    const BATCH_SIZE: usize = 1000;

    group.bench_function("box_new", |b| {
        b.iter(|| {
            let mut v = Vec::with_capacity(BATCH_SIZE);
            for i in 0..BATCH_SIZE {
                v.push(Box::new(i as u64));
            }
            black_box(v);
        })
    });

    group.bench_function("arena_alloc", |b| {
        b.iter_batched(
            || Arena::new(64 * 1024),
            |mut arena| {
                for _ in 0..BATCH_SIZE {
                    black_box(arena.alloc(core::mem::size_of::<u64>()));
                }
                arena
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_arena_reset_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_reset_reuse");

    group.bench_function("fill_and_reset", |b| {
        let mut arena = Arena::new(64 * 1024);
        b.iter(|| {
            while arena.alloc(64).is_some() {}
            black_box(arena.used());
            arena.reset();
        })
    });

    group.finish();
}

fn bench_pool_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_churn");

    group.bench_function("pool_alloc_free", |b| {
        let pool = Pool::new(64, 1024);
        b.iter(|| {
            let block = pool.alloc().unwrap();
            unsafe { pool.free(black_box(block)) };
        })
    });

    group.bench_function("box_alloc_drop", |b| {
        b.iter(|| {
            black_box(Box::new([0u8; 64]));
        })
    });

    group.finish();
}

fn bench_pool_drain_refill(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_drain_refill");
    const COUNT: usize = 512;

    group.bench_function("drain_then_free_all", |b| {
        let pool = Pool::new(64, COUNT);
        let mut held = Vec::with_capacity(COUNT);
        b.iter(|| {
            while let Some(block) = pool.alloc() {
                held.push(block);
            }
            for block in held.drain(..) {
                unsafe { pool.free(block) };
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_arena_batch,
    bench_arena_reset_reuse,
    bench_pool_churn,
    bench_pool_drain_refill
);
criterion_main!(benches);
