use ndarray::{Array1, ArrayView1, ArrayView2};

use super::LossFn;

/// Adds an L2 penalty `0.5 * lambda * ||w||²` to an inner objective.
#[derive(Debug, Clone, Copy)]
pub struct Ridge<L> {
    inner: L,
    lambda: f64,
}

impl<L: LossFn> Ridge<L> {
    /// Creates a new `Ridge` objective.
    ///
    /// # Arguments
    /// * `inner` - The smooth objective being penalized.
    /// * `lambda` - The penalty weight, zero leaves `inner` untouched.
    pub fn new(inner: L, lambda: f64) -> Self {
        Self { inner, lambda }
    }
}

impl<L: LossFn> LossFn for Ridge<L> {
    fn loss_grad(
        &self,
        w: ArrayView1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> (f64, Array1<f64>) {
        let (f, mut g) = self.inner.loss_grad(w, x, y);
        if self.lambda == 0. {
            return (f, g);
        }

        g.scaled_add(self.lambda, &w);
        (f + 0.5 * self.lambda * w.dot(&w), g)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::objective::LeastSquares;

    #[test]
    fn penalty_is_added_to_loss_and_gradient() {
        let x = array![[1., 0.], [0., 1.]];
        let y = array![1., 2.];
        let w = array![1., 2.];

        let (f, g) = Ridge::new(LeastSquares, 2.).loss_grad(w.view(), x.view(), y.view());
        assert_eq!(f, 5.);
        assert_eq!(g, array![2., 4.]);
    }
}
