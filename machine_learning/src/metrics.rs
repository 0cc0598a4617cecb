use ndarray::ArrayView1;

use crate::{MlErr, Result};

fn check_sizes(y: ArrayView1<f64>, y_hat: ArrayView1<f64>) -> Result<()> {
    if y.len() != y_hat.len() {
        return Err(MlErr::SizeMismatch {
            what: "predictions",
            got: y_hat.len(),
            expected: y.len(),
        });
    }

    if y.is_empty() {
        return Err(MlErr::InvalidInput("can't measure the error of zero samples"));
    }

    Ok(())
}

/// The fraction of samples whose predicted label differs from the true one.
pub fn classification_error(y: ArrayView1<f64>, y_hat: ArrayView1<f64>) -> Result<f64> {
    check_sizes(y, y_hat)?;

    let wrong = y.iter().zip(y_hat).filter(|(a, b)| a != b).count();
    Ok(wrong as f64 / y.len() as f64)
}

/// Half the mean squared residual, `0.5 * Σ(y - ŷ)² / n`.
pub fn regression_error(y: ArrayView1<f64>, y_hat: ArrayView1<f64>) -> Result<f64> {
    check_sizes(y, y_hat)?;

    let sum: f64 = y.iter().zip(y_hat).map(|(a, b)| (a - b).powi(2)).sum();
    Ok(0.5 * sum / y.len() as f64)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn classification_error_counts_mismatches() {
        let y = array![1., -1., 1., 1.];
        let y_hat = array![1., 1., 1., -1.];

        assert_eq!(classification_error(y.view(), y_hat.view()).unwrap(), 0.5);
    }

    #[test]
    fn regression_error_is_half_the_mse() {
        let y = array![1., 2.];
        let y_hat = array![0., 4.];

        assert_eq!(regression_error(y.view(), y_hat.view()).unwrap(), 1.25);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let y = array![1., 2.];
        let y_hat = array![1.];

        assert!(regression_error(y.view(), y_hat.view()).is_err());
    }
}
