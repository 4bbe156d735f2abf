use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use salt_preparation::dataloader::{init_worker_rng, DataLoader, DataLoaderConfig};
use salt_preparation::dataset::{Dataset, Mode, SaltDataset, SaltDatasetConfig};

/// Benchmarks for sample assembly.
///
/// This measures:
/// 1. Per-sample cost of each mode at the 101 -> 128 padded layout
/// 2. Epoch throughput of the loader as the worker count grows
///
/// To run these, use:
/// ```bash
/// cargo bench --bench dataset_bench
/// ```
const SAMPLES: usize = 256;

fn make_dataset(mode: Mode) -> SaltDataset {
    let images = (0..SAMPLES)
        .map(|i| Array2::from_shape_fn((101, 101), |(y, x)| ((x + y + i) % 255) as f32 / 255.0))
        .collect();
    let masks = (0..SAMPLES)
        .map(|i| Array2::from_shape_fn((101, 101), |(y, _)| if y + i % 40 > 70 { 1.0 } else { 0.0 }))
        .collect();
    let config = SaltDatasetConfig::builder()
        .mode(mode)
        .pad(13, 14)
        .build()
        .expect("valid config");
    SaltDataset::new(images, Some(masks), config).expect("valid dataset")
}

/// Measure single-sample assembly per mode.
fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sample Assembly");
    group.throughput(Throughput::Elements(1));
    init_worker_rng(0, 0, 42);

    for (name, mode) in [
        ("train", Mode::Train),
        ("val", Mode::Val),
        ("tta", Mode::Tta { mirror: true }),
        ("infer", Mode::Infer),
    ] {
        let ds = make_dataset(mode);
        let mut index = 0;
        group.bench_function(BenchmarkId::new("get", name), |b| {
            b.iter(|| {
                index = (index + 1) % SAMPLES;
                black_box(ds.get(index).expect("sample"))
            })
        });
    }
    group.finish();
}

/// Measure a full TRAIN epoch through the loader.
fn bench_loader(c: &mut Criterion) {
    let mut group = c.benchmark_group("Loader Epoch");
    group.throughput(Throughput::Elements(SAMPLES as u64));
    group.sample_size(10);

    for workers in [0, 2, 4] {
        let config = DataLoaderConfig::builder()
            .batch_size(32)
            .shuffle(true)
            .seed(7)
            .num_workers(workers)
            .build();
        let loader = DataLoader::new(make_dataset(Mode::Train), config).expect("loader");

        group.bench_with_input(BenchmarkId::new("workers", workers), &loader, |b, loader| {
            b.iter(|| {
                let batches = loader
                    .iter()
                    .expect("epoch")
                    .map(|batch| batch.expect("batch"))
                    .count();
                black_box(batches)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_assembly, bench_loader);
criterion_main!(benches);
