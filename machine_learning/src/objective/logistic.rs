use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

use super::LossFn;

/// `log(1 + e^z)` without overflowing for large `z`.
fn softplus(z: f64) -> f64 {
    z.max(0.) + (-z.abs()).exp().ln_1p()
}

/// `1 / (1 + e^-z)` without overflowing for very negative `z`.
fn sigmoid(z: f64) -> f64 {
    if z >= 0. {
        1. / (1. + (-z).exp())
    } else {
        let e = z.exp();
        e / (1. + e)
    }
}

/// Logistic loss for labels in {-1, +1}, `Σ log(1 + exp(-y_i * x_iᵀw))`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logistic;

impl Logistic {
    /// Returns a new `Logistic`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Logistic {
    fn loss_grad(
        &self,
        w: ArrayView1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> (f64, Array1<f64>) {
        let margins = x.dot(&w) * y;
        let f: f64 = margins.iter().map(|&m| softplus(-m)).sum();

        let mut res = Array1::<f64>::zeros(y.len());
        Zip::from(&mut res)
            .and(&margins)
            .and(y)
            .for_each(|r, &m, &yi| *r = -yi * sigmoid(-m));

        (f, x.t().dot(&res))
    }
}
