//! Benchmarks for cfx operations.
//!
//! Run with: `cargo bench`

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cfx_core::{ChannelSet, ImageBuffer};
use cfx_host::{FilterHost, FilterPool, Packet};
use cfx_ops::compose::blend;
use cfx_ops::convolve::{ConvolveOptions, convolve};
use cfx_ops::{FilterCatalog, FilterDescriptor, Kernel, Workstore, apply_filters};

fn random_image(size: u32, seed: u64) -> ImageBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..size * size * 4).map(|_| rng.r#gen()).collect();
    ImageBuffer { width: size, height: size, data }
}

/// Benchmark brush construction.
fn bench_brush(c: &mut Criterion) {
    let mut group = c.benchmark_group("brush");
    for radius in [2.0, 8.0, 24.0] {
        group.bench_with_input(BenchmarkId::new("star", radius), &radius, |b, &r| {
            b.iter(|| Kernel::brush(black_box(r), black_box(r * 0.5), black_box(30.0)))
        });
    }
    group.finish();
}

/// Benchmark the convolution engine.
fn bench_convolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolve");
    for size in [64u32, 256, 512] {
        let set = ChannelSet::from_image(&random_image(size, 1));
        group.throughput(Throughput::Elements((size * size) as u64));

        let brush = Kernel::brush(4.0, 4.0, 0.0);
        group.bench_with_input(BenchmarkId::new("brush_r4", size), &set, |b, s| {
            b.iter(|| convolve(&brush, black_box(s), size as usize, size as usize, &ConvolveOptions::default()))
        });

        let sharpen = Kernel::from_weights(&[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0]);
        group.bench_with_input(BenchmarkId::new("sharpen", size), &set, |b, s| {
            b.iter(|| convolve(&sharpen, black_box(s), size as usize, size as usize, &ConvolveOptions::default()))
        });
    }
    group.finish();
}

/// Benchmark opacity blending.
fn bench_blend(c: &mut Criterion) {
    let mut group = c.benchmark_group("blend");
    let size = 512u32;
    let base = ChannelSet::from_image(&random_image(size, 1));
    let overlay = ChannelSet::from_image(&random_image(size, 2));
    group.throughput(Throughput::Elements((size * size) as u64));
    for ratio in [0.5, 1.0] {
        group.bench_with_input(BenchmarkId::new("ratio", ratio), &ratio, |b, &r| {
            b.iter(|| {
                let mut work = base.clone();
                blend(&mut work, black_box(&overlay), r).ok();
                work
            })
        });
    }
    group.finish();
}

/// Benchmark whole filter chains.
fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    let catalog = FilterCatalog::standard();
    let image = random_image(256, 1);
    group.throughput(Throughput::Elements(256 * 256));

    let chains: [(&str, Vec<FilterDescriptor>); 3] = [
        ("grayscale", vec![FilterDescriptor::new("grayscale")]),
        ("sepia_half", vec![FilterDescriptor::new("sepia").with_opacity(0.5)]),
        (
            "blur_threshold",
            vec![
                FilterDescriptor::new("blur").with_param("radius", 3),
                FilterDescriptor::new("threshold"),
            ],
        ),
    ];
    for (name, filters) in chains {
        let mut store = Workstore::default();
        let mut prepared = filters;
        catalog.preprocess_all(&mut prepared);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut img = image.clone();
                apply_filters(&mut img, &mut prepared, &catalog, &mut store).ok();
                img
            })
        });
    }

    let mut host = FilterHost::new(Arc::new(FilterCatalog::standard()));
    group.bench_function("host_invert", |b| {
        b.iter(|| host.process(Packet::new(image.clone(), vec![FilterDescriptor::new("invert")])))
    });
    group.finish();
}

/// Benchmark pool round trips.
fn bench_pool(c: &mut Criterion) {
    let pool = FilterPool::builder().max_hosts(4).prewarm(4).build().unwrap();
    let image = random_image(128, 1);
    c.bench_function("pool_roundtrip_8", |b| {
        b.iter(|| {
            let tickets: Vec<_> = (0..8)
                .map(|_| pool.submit(Packet::new(image.clone(), vec![FilterDescriptor::new("gray")])).unwrap())
                .collect();
            for t in tickets {
                black_box(t.wait().unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_brush,
    bench_convolve,
    bench_blend,
    bench_chain,
    bench_pool,
);

criterion_main!(benches);
