use std::collections::BTreeSet;

use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::{
    MlErr, Result,
    objective::LossFn,
    optimization::{LineSearch, MinimizeReport},
};

fn fit_subset<L: LossFn>(
    line_search: &LineSearch,
    objective: &L,
    subset: &BTreeSet<usize>,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
) -> Result<MinimizeReport> {
    let columns: Vec<usize> = subset.iter().copied().collect();
    let xs = x.select(Axis(1), &columns);
    line_search.minimize(objective, Array1::zeros(columns.len()), 1., xs.view(), y)
}

/// Greedy forward selection approximating `min f(w) + lambda * ||w||₀`.
///
/// Starts from the bias column and keeps adding the column whose sub-fit scores lowest until no
/// candidate strictly improves the score `loss + lambda * |S|`.
///
/// # Returns
/// The report of the final sub-fit with `w` scattered back to all `d` coordinates, zero outside
/// the selected set, and `evals` summed over every sub-fit.
pub fn forward_select<L: LossFn>(
    line_search: &LineSearch,
    objective: &L,
    lambda: f64,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
) -> Result<MinimizeReport> {
    if !(lambda.is_finite() && lambda >= 0.) {
        return Err(MlErr::InvalidParameter {
            what: "l0 lambda",
            value: lambda,
        });
    }

    let d = x.ncols();
    let score = |report: &MinimizeReport, size: usize| report.loss + lambda * size as f64;

    let mut selected = BTreeSet::from([0]);
    let mut best = fit_subset(line_search, objective, &selected, x, y)?;
    let mut evals = best.evals;
    let mut best_score = score(&best, 1);

    loop {
        let mut round: Option<(usize, MinimizeReport, f64)> = None;

        for i in (0..d).filter(|i| !selected.contains(i)) {
            let mut candidate = selected.clone();
            candidate.insert(i);

            let report = fit_subset(line_search, objective, &candidate, x, y)?;
            evals += report.evals;
            let candidate_score = score(&report, candidate.len());

            if round.as_ref().is_none_or(|(_, _, s)| candidate_score < *s) {
                round = Some((i, report, candidate_score));
            }
        }

        match round {
            Some((i, report, candidate_score)) if candidate_score < best_score => {
                selected.insert(i);
                best = report;
                best_score = candidate_score;
            }
            _ => break,
        }
    }

    debug!("forward selection kept {} of {d} features", selected.len());

    let mut w = Array1::zeros(d);
    for (&i, &wi) in selected.iter().zip(&best.w) {
        w[i] = wi;
    }

    Ok(MinimizeReport {
        w,
        evals,
        step: 1.,
        ..best
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use ndarray::{Array2, array};

    use super::*;
    use crate::objective::LeastSquares;

    fn line_search() -> LineSearch {
        LineSearch::new(NonZeroUsize::new(500).unwrap(), 1e-6, 1e-4)
    }

    /// y depends on the bias and the second feature only.
    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((20, 4), |(i, j)| match j {
            0 => 1.,
            1 => (i as f64 * 0.37).sin(),
            2 => (i as f64 * 1.3).cos(),
            _ => ((i * 7 % 5) as f64 - 2.) / 2.,
        });
        let y = x.column(0).mapv(|b| 0.5 * b) + x.column(2).mapv(|v| 3. * v);
        (x, y)
    }

    #[test]
    fn picks_the_informative_feature() {
        let (x, y) = data();
        let report = forward_select(&line_search(), &LeastSquares, 1., x.view(), y.view()).unwrap();

        assert!(report.w[2] != 0.);
        assert_eq!(report.w[1], 0.);
        assert_eq!(report.w[3], 0.);
        assert!((report.w[2] - 3.).abs() < 1e-3);
    }

    #[test]
    fn huge_penalty_keeps_only_the_bias() {
        let (x, y) = data();
        let report = forward_select(&line_search(), &LeastSquares, 1e9, x.view(), y.view()).unwrap();

        let nonzero: Vec<_> = (0..4).filter(|&i| report.w[i] != 0.).collect();
        assert!(nonzero.iter().all(|&i| i == 0));
    }

    #[test]
    fn negative_lambda_is_rejected() {
        let (x, y) = data();
        assert!(forward_select(&line_search(), &LeastSquares, -1., x.view(), y.view()).is_err());
    }

    #[test]
    fn selected_weights_match_a_direct_subset_fit() {
        let x = array![[1., 1., 0.], [1., 2., 0.], [1., 3., 1.], [1., 4., 0.]];
        let y = array![2., 4., 6., 8.];
        let report = forward_select(&line_search(), &LeastSquares, 0.5, x.view(), y.view()).unwrap();

        assert_eq!(report.w[2], 0.);
        assert!((report.w[1] - 2.).abs() < 1e-3);
    }
}
