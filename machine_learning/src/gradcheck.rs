use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{MlErr, Result, objective::LossFn};

/// The step of the central differences.
pub const FINITE_DIFF_STEP: f64 = 1e-6;

/// Approximates the gradient of `f` at `w` with central differences of step `h`.
pub fn numeric_gradient<F>(f: F, w: ArrayView1<f64>, h: f64) -> Array1<f64>
where
    F: Fn(ArrayView1<f64>) -> f64,
{
    let mut shifted = w.to_owned();

    Array1::from_shape_fn(w.len(), |i| {
        let wi = shifted[i];

        shifted[i] = wi + h;
        let plus = f(shifted.view());
        shifted[i] = wi - h;
        let minus = f(shifted.view());
        shifted[i] = wi;

        (plus - minus) / (2. * h)
    })
}

/// Checks the analytic gradient of `objective` at `w` against central differences.
///
/// # Arguments
/// * `objective` - The objective whose gradient is checked.
/// * `w` - The point to check at.
/// * `x` - The feature matrix.
/// * `y` - The targets.
/// * `tol` - The largest admissible absolute difference per coordinate.
///
/// # Returns
/// `GradientMismatch` naming the first coordinate that differs by more than `tol`.
pub fn check_gradient<L: LossFn>(
    objective: &L,
    w: ArrayView1<f64>,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    tol: f64,
) -> Result<()> {
    if w.len() != x.ncols() {
        return Err(MlErr::SizeMismatch {
            what: "parameters",
            got: w.len(),
            expected: x.ncols(),
        });
    }

    let (_, analytic) = objective.loss_grad(w, x, y);
    let numeric = numeric_gradient(|w| objective.loss(w, x, y), w, FINITE_DIFF_STEP);

    for (index, (&a, &n)) in analytic.iter().zip(&numeric).enumerate() {
        if !((a - n).abs() <= tol) {
            return Err(MlErr::GradientMismatch {
                index,
                analytic: a,
                numeric: n,
            });
        }
    }

    Ok(())
}
