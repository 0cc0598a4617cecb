use ndarray::{Array1, ArrayView1, ArrayView2};

use super::LossFn;

/// Least squares loss, `0.5 * ||Xw - y||²`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastSquares;

impl LeastSquares {
    /// Returns a new `LeastSquares`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for LeastSquares {
    fn loss_grad(
        &self,
        w: ArrayView1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> (f64, Array1<f64>) {
        let r = x.dot(&w) - y;
        let f = 0.5 * r.dot(&r);
        let g = x.t().dot(&r);
        (f, g)
    }
}
