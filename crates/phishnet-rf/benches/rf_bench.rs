//! Criterion benchmarks for phishnet-rf: training, prediction and splitting.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use phishnet_rf::{RandomForestConfig, train_test_split};

/// `n_samples` rows of 15 count-like features; the label depends on the first two.
fn make_urls(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..15).map(|_| f64::from(rng.gen_range(0..40u8))).collect();
        labels.push(usize::from(row[0] + row[1] > 40.0));
        features.push(row);
    }
    let names = (0..15).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_fit(c: &mut Criterion) {
    let (features, labels, names) = make_urls(2000, 42);
    let cfg = RandomForestConfig::new(100)
        .unwrap()
        .with_max_depth(Some(10))
        .with_seed(42);

    c.bench_function("rf_fit_2000x15_100trees_depth10", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_urls(2000, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_max_depth(Some(10))
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();

    c.bench_function("rf_predict_batch_2000x15_100trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

fn bench_split(c: &mut Criterion) {
    c.bench_function("train_test_split_100k", |b| {
        b.iter(|| train_test_split(100_000, 0.2, 42).unwrap());
    });
}

criterion_group!(benches, bench_fit, bench_predict_batch, bench_split);
criterion_main!(benches);
