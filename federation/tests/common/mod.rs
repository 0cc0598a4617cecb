#![allow(dead_code)]

use comms::specs::machine_learning::LocalModelSpec;
use machine_learning::{dataset::Partition, model::LocalModel, training::LocalModelBuilder};
use ndarray::{Array1, Array2, Axis, array, concatenate};
use ndarray_rand::{
    RandomExt,
    rand::{SeedableRng, rngs::StdRng},
    rand_distr::Normal,
};

pub const FEATURES: usize = 5;

/// Labels `sign(xᵀw)` of a fixed hyperplane through the origin, keeping only samples at least
/// `margin` away from it. Classes alternate row by row, so every contiguous even chunk is
/// balanced. The bias column comes first.
pub fn separable(n: usize, margin: f64, seed: u64) -> Partition {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0., 1.).unwrap();
    let w_true = array![0., 2., -1., 0.5, 1.5, -0.5];

    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    while rows.len() < n {
        let features = Array1::random_using(FEATURES, normal, &mut rng);
        let x = concatenate![Axis(0), array![1.], features];
        let score = x.dot(&w_true);

        let label = if rows.len() % 2 == 0 { 1. } else { -1. };
        if score * label >= margin {
            labels.push(label);
            rows.push(x);
        }
    }

    let views: Vec<_> = rows.iter().map(|r| r.view()).collect();
    let x = ndarray::stack(Axis(0), &views).unwrap();
    Partition::new(x, Array1::from(labels)).unwrap()
}

/// A noisy linear regression problem, bias column first.
pub fn regression(n: usize, seed: u64) -> Partition {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = Array2::random_using((n, FEATURES), Normal::new(0., 1.).unwrap(), &mut rng);
    let x = concatenate![Axis(1), Array2::<f64>::ones((n, 1)), features];

    let w_true = array![0.5, 1., -2., 0., 3., 1.];
    let noise = Array1::random_using(n, Normal::new(0., 0.5).unwrap(), &mut rng);
    let y = x.dot(&w_true) + noise;
    Partition::new(x, y).unwrap()
}

/// Builds one model per partition, fitted when `fit` is set.
pub fn local_models(parts: &[Partition], spec: &LocalModelSpec, fit: bool) -> Vec<LocalModel> {
    let builder = LocalModelBuilder::new();

    parts
        .iter()
        .map(|part| {
            let mut model = builder.build(spec.clone(), part.clone()).unwrap();
            if fit {
                model.fit().unwrap();
            }
            model
        })
        .collect()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
