use std::collections::HashMap;

use log::{debug, warn};
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{FederationErr, Result};

/// Turns the errors every client measured on every candidate model into combination weights.
///
/// Each client ranks the models by ascending error with dense ranks (equal errors share a rank),
/// starting at 0 when the client reported `-inf` and at 1 otherwise. Model `j` then scores
/// `Σ_i size_i * 2^(-rank(i, j))` over the clients with data and a nonzero rank. Scores below the
/// median are dropped and the rest normalized to sum to one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RankWeightGenerator;

/// Dense ranks of `row` keyed by exact bit patterns.
fn dense_ranks(row: ArrayView1<f64>) -> Vec<u32> {
    let mut sorted: Vec<f64> = row.to_vec();
    sorted.sort_by(f64::total_cmp);

    let first = if sorted.first() == Some(&f64::NEG_INFINITY) {
        0
    } else {
        1
    };

    let mut ranks = HashMap::new();
    for value in sorted {
        let next = first + ranks.len() as u32;
        ranks.entry(value.to_bits()).or_insert(next);
    }

    row.iter().map(|v| ranks[&v.to_bits()]).collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.
    } else {
        sorted[mid]
    }
}

impl RankWeightGenerator {
    /// Creates a new `RankWeightGenerator`.
    pub fn new() -> Self {
        Self
    }

    /// Generates the combination weights.
    ///
    /// # Arguments
    /// * `errors` - An `r x c` matrix, `errors[(i, j)]` is the error client `i` measured on model `j`.
    /// * `sizes` - The `r` dataset sizes of the clients.
    ///
    /// # Returns
    /// `c` non negative weights summing to one, uniform when every score is dropped, or an error
    /// if the inputs are malformed.
    pub fn generate(&self, errors: ArrayView2<f64>, sizes: ArrayView1<f64>) -> Result<Array1<f64>> {
        let (rows, cols) = errors.dim();
        if rows != sizes.len() {
            return Err(FederationErr::SizeMismatch {
                what: "client sizes",
                got: sizes.len(),
                expected: rows,
            });
        }

        if rows == 0 || cols == 0 {
            return Err(FederationErr::InvalidInput("the error matrix is empty"));
        }

        if errors.iter().any(|e| e.is_nan()) {
            return Err(FederationErr::InvalidInput("errors can't be NaN"));
        }

        if sizes.iter().any(|s| !(s.is_finite() && *s >= 0.)) {
            return Err(FederationErr::InvalidInput("sizes must be finite and non negative"));
        }

        let mut scores = vec![0.; cols];
        for (row, &size) in errors.rows().into_iter().zip(sizes) {
            if size == 0. {
                continue;
            }

            for (score, rank) in scores.iter_mut().zip(dense_ranks(row)) {
                if rank > 0 {
                    *score += size * 2f64.powi(-(rank as i32));
                }
            }
        }

        let threshold = median(&scores);
        for score in scores.iter_mut().filter(|s| **s < threshold) {
            *score = 0.;
        }

        let total: f64 = scores.iter().sum();
        if !(total.is_finite() && total > 0.) {
            warn!("every model score was dropped, falling back to uniform weights");
            return Ok(Array1::from_elem(cols, 1. / cols as f64));
        }

        let weights = Array1::from(scores) / total;
        debug!("rank weights {weights}");
        Ok(weights)
    }
}
