use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use palloc::{DynamicSlab, Slab, BATCH};

fn bench_slab_cached_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("slab_cached_churn");
    group.throughput(Throughput::Elements(2));

    let slab = Slab::new(4.0);
    for size in [8usize, 32, 64, 256, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let block = slab.alloc(size).unwrap();
                unsafe { slab.free(black_box(block.as_ptr()), size) };
            })
        });
    }

    group.finish();
}

fn bench_slab_refill_pressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("slab_refill_pressure");

    // Holding more than one batch makes every cycle cross the refill/flush
    // boundary instead of staying on the cached fast path.
    let hold = BATCH + 1;
    let slab = Slab::new(4.0);
    let mut held = Vec::with_capacity(hold);

    group.bench_function("hold_batch_plus_one", |b| {
        b.iter(|| {
            for _ in 0..hold {
                held.push(slab.alloc(32).unwrap());
            }
            for block in held.drain(..) {
                unsafe { slab.free(block.as_ptr(), 32) };
            }
        })
    });

    group.finish();
}

fn bench_slab_calloc(c: &mut Criterion) {
    let mut group = c.benchmark_group("slab_calloc");

    let slab = Slab::new(4.0);
    for size in [64usize, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let block = slab.calloc(size).unwrap();
                unsafe { slab.free(black_box(block.as_ptr()), size) };
            })
        });
    }

    group.finish();
}

fn bench_dynamic_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("dynamic_churn");
    group.throughput(Throughput::Elements(2));

    let dynamic = DynamicSlab::new(4.0);
    for size in [32usize, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let block = dynamic.palloc(size).unwrap();
                unsafe { dynamic.free(black_box(block.as_ptr()), size) };
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_slab_cached_churn,
    bench_slab_refill_pressure,
    bench_slab_calloc,
    bench_dynamic_churn
);
criterion_main!(benches);
