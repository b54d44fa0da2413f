//! Criterion benchmarks for sylva-forest: tree induction, forest training, and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sylva_forest::{Dataset, DecisionTree, ForestConfig};

fn make_categorical(
    n_records: usize,
    n_attributes: usize,
    n_classes: usize,
    seed: u64,
) -> (Dataset, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows: Vec<Vec<String>> = (0..n_records)
        .map(|i| {
            let class = i % n_classes;
            let mut row: Vec<String> = (0..n_attributes)
                .map(|a| {
                    if a < 3 && rng.gen_bool(0.8) {
                        format!("c{class}")
                    } else {
                        format!("v{}", rng.gen_range(0..4))
                    }
                })
                .collect();
            row.push(format!("class{class}"));
            row
        })
        .collect();
    let names = (0..n_attributes).map(|a| format!("a{a}")).collect();
    (Dataset::from_rows(rows).unwrap(), names)
}

fn bench_forest_train(c: &mut Criterion) {
    let (data, names) = make_categorical(500, 20, 5, 42);
    let cfg = ForestConfig::new(50).unwrap().with_seed(42);

    c.bench_function("forest_train_500x20_5class_50trees", |b| {
        b.iter(|| cfg.fit(&data, &names).unwrap());
    });
}

fn bench_classify_batch(c: &mut Criterion) {
    let (data, names) = make_categorical(500, 20, 5, 42);
    let forest = ForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&data, &names)
        .unwrap()
        .into_forest();

    c.bench_function("forest_classify_batch_500x20_50trees", |b| {
        b.iter(|| forest.classify_batch(data.records()).unwrap());
    });
}

fn bench_tree_induction(c: &mut Criterion) {
    let (data, _) = make_categorical(500, 20, 5, 42);

    c.bench_function("id3_tree_500x20_5class", |b| {
        b.iter(|| DecisionTree::fit_all(&data).unwrap());
    });
}

criterion_group!(benches, bench_forest_train, bench_classify_batch, bench_tree_induction);
criterion_main!(benches);
