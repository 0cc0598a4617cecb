use faer::{
    Mat, Side,
    linalg::solvers::{Llt, Solve},
};
use log::warn;
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{FederationErr, Result};

/// Relative floor for the squared Cholesky pivots of `MᵀM`.
const PIVOT_TOL: f64 = 1e-12;

/// Solves `(MᵀM) v = Mᵀy` for the combination weights `v` of the columns of `M`.
///
/// # Arguments
/// * `m` - The `n x k` matrix of per model predictions.
/// * `y` - The `n` targets.
///
/// # Returns
/// The `k` weights, or `IllConditioned` when `MᵀM` is singular or numerically close to it.
pub fn solve_normal_equations(m: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>> {
    let (n, k) = m.dim();
    if y.len() != n {
        return Err(FederationErr::SizeMismatch {
            what: "aggregation targets",
            got: y.len(),
            expected: n,
        });
    }

    let gram = m.t().dot(&m);
    let rhs = m.t().dot(&y);
    let ill_conditioned = || {
        warn!("normal equations of {k} models are ill conditioned");
        FederationErr::IllConditioned { models: k }
    };

    let a = Mat::from_fn(k, k, |i, j| gram[[i, j]]);
    let b = Mat::from_fn(k, 1, |i, _| rhs[i]);

    let llt = Llt::new(a.as_ref(), Side::Lower).map_err(|_| ill_conditioned())?;

    let max_diag = gram.diag().fold(0., |acc: f64, d| acc.max(*d));
    let l = llt.L();
    if (0..k).any(|i| l[(i, i)].powi(2) <= PIVOT_TOL * max_diag) {
        return Err(ill_conditioned());
    }

    let v = llt.solve(b.as_ref());
    Ok(Array1::from_shape_fn(k, |i| v[(i, 0)]))
}
