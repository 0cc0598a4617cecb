use ndarray::{Array1, ArrayView1, ArrayView2};

use super::{LineSearch, Penalty};
use crate::{MlErr, Result, objective::LossFn};

/// A sparsified parameter update together with the objective at the unsparsified trial point.
#[derive(Debug, Clone)]
pub struct SparseUpdate {
    pub delta: Array1<f64>,
    pub loss: f64,
    pub grad: Array1<f64>,
    /// The optimality measure of the penalized objective at the trial point.
    pub opt_cond: f64,
}

/// How many coordinates a client shares, `floor(d * theta)`.
///
/// # Returns
/// An error if `theta` is not within [0, 1].
pub fn shared_coordinates(d: usize, theta: f64) -> Result<usize> {
    if !(0.0..=1.0).contains(&theta) {
        return Err(MlErr::InvalidParameter {
            what: "theta",
            value: theta,
        });
    }

    Ok((d as f64 * theta).floor() as usize)
}

/// Zeroes every coordinate of `v` but the `k` largest in magnitude, ties go to the lower index.
pub fn top_k(v: &mut Array1<f64>, k: usize) {
    if k >= v.len() {
        return;
    }

    let mut order: Vec<usize> = (0..v.len()).collect();
    order.sort_by(|&a, &b| v[b].abs().total_cmp(&v[a].abs()).then(a.cmp(&b)));

    for &i in &order[k..] {
        v[i] = 0.;
    }
}

/// Produces the sparse updates a client shares during federated fitting.
pub struct SparseUpdateProducer<'a> {
    line_search: &'a LineSearch,
}

impl<'a> SparseUpdateProducer<'a> {
    /// Creates a new `SparseUpdateProducer`.
    ///
    /// # Arguments
    /// * `line_search` - Takes the single gradient step whose move gets sparsified.
    pub fn new(line_search: &'a LineSearch) -> Self {
        Self { line_search }
    }

    /// Takes one line search step from `w`, starting from a unit step, and keeps only the
    /// largest `floor(d * theta)` coordinates of the move.
    ///
    /// # Arguments
    /// * `objective` - The client's objective.
    /// * `penalty` - The non smooth part of the client's objective.
    /// * `theta` - The fraction of coordinates to share.
    /// * `w` - The shared parameters.
    /// * `x` - The client's features.
    /// * `y` - The client's targets.
    ///
    /// # Returns
    /// The sparse move plus the loss and gradient at the full trial point.
    pub fn produce<L: LossFn>(
        &self,
        objective: &L,
        penalty: Penalty,
        theta: f64,
        w: ArrayView1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<SparseUpdate> {
        let k = shared_coordinates(w.len(), theta)?;

        let step = self.line_search.step(objective, penalty, w, 1., x, y)?;
        let mut delta = step.delta;
        top_k(&mut delta, k);

        Ok(SparseUpdate {
            delta,
            loss: step.loss,
            opt_cond: penalty.opt_cond(step.w.view(), step.grad.view()),
            grad: step.grad,
        })
    }
}
