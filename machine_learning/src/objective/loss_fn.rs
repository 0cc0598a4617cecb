use ndarray::{Array1, ArrayView1, ArrayView2};

/// A differentiable objective of a linear model over a fixed data partition.
pub trait LossFn {
    /// Evaluates the objective and its gradient.
    ///
    /// # Arguments
    /// * `w` - The parameters, one per column of `x`.
    /// * `x` - The `n x d` feature matrix.
    /// * `y` - The `n` targets.
    ///
    /// # Returns
    /// The scalar loss and the gradient with respect to `w`.
    fn loss_grad(
        &self,
        w: ArrayView1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> (f64, Array1<f64>);

    /// Evaluates only the objective.
    fn loss(&self, w: ArrayView1<f64>, x: ArrayView2<f64>, y: ArrayView1<f64>) -> f64 {
        self.loss_grad(w, x, y).0
    }
}
