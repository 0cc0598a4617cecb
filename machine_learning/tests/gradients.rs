use machine_learning::{
    MlErr,
    gradcheck::check_gradient,
    objective::{LeastSquares, Logistic, LossFn, Ridge},
};
use ndarray::{Array1, Array2, Axis, concatenate};
use ndarray_rand::{
    RandomExt,
    rand::{SeedableRng, rngs::StdRng},
    rand_distr::Normal,
};

const TOL: f64 = 1e-4;

struct Problem {
    x: Array2<f64>,
    y: Array1<f64>,
    labels: Array1<f64>,
    w: Array1<f64>,
}

fn problem(seed: u64) -> Problem {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0., 1.).unwrap();

    let features = Array2::random_using((30, 4), normal, &mut rng);
    let x = concatenate![Axis(1), Array2::<f64>::ones((30, 1)), features];
    let w = Array1::random_using(5, normal, &mut rng);
    let y = Array1::random_using(30, normal, &mut rng);
    let labels = y.mapv(|v| if v >= 0. { 1. } else { -1. });

    Problem { x, y, labels, w }
}

fn check<L: LossFn>(objective: &L, seed: u64, labels: bool) -> Result<(), MlErr> {
    let p = problem(seed);
    let y = if labels { &p.labels } else { &p.y };
    check_gradient(objective, p.w.view(), p.x.view(), y.view(), TOL)
}

#[test]
fn least_squares_gradient_matches_finite_differences() {
    for seed in 0..3 {
        check(&LeastSquares, seed, false).unwrap();
    }
}

#[test]
fn logistic_gradient_matches_finite_differences() {
    for seed in 0..3 {
        check(&Logistic, seed, true).unwrap();
    }
}

#[test]
fn ridge_gradients_match_finite_differences() {
    check(&Ridge::new(LeastSquares, 0.7), 4, false).unwrap();
    check(&Ridge::new(Logistic, 1.), 5, true).unwrap();
}

#[test]
fn gradient_vanishes_at_the_least_squares_solution() {
    // With y = Xw exactly the residual and so the gradient are zero.
    let p = problem(9);
    let y = p.x.dot(&p.w);
    let (f, g) = LeastSquares.loss_grad(p.w.view(), p.x.view(), y.view());

    assert!(f < 1e-20);
    assert!(g.iter().all(|v| v.abs() < 1e-10));
}
