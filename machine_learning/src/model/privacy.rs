use comms::specs::machine_learning::{LocalModelSpec, RegularizationSpec};
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::{MlErr, Result};

/// Laplace noise with scale `sensitivity / epsilon`, drawn as the difference of two exponential
/// variates of rate `epsilon / sensitivity`.
#[derive(Debug, Clone, Copy)]
pub struct LaplaceNoise {
    exp: Exp<f64>,
}

impl LaplaceNoise {
    /// Creates a new `LaplaceNoise` distribution.
    ///
    /// # Arguments
    /// * `sensitivity` - How much a single sample can move the released value.
    /// * `epsilon` - The privacy budget, smaller means noisier.
    ///
    /// # Returns
    /// An error unless both arguments are positive and finite.
    pub fn new(sensitivity: f64, epsilon: f64) -> Result<Self> {
        for (what, value) in [("sensitivity", sensitivity), ("epsilon", epsilon)] {
            if !(value.is_finite() && value > 0.) {
                return Err(MlErr::InvalidParameter { what, value });
            }
        }

        let rate = epsilon / sensitivity;
        let exp = Exp::new(rate).map_err(|_| MlErr::InvalidParameter {
            what: "laplace rate",
            value: rate,
        })?;

        Ok(Self { exp })
    }
}

impl Distribution<f64> for LaplaceNoise {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.exp.sample(rng) - self.exp.sample(rng)
    }
}

/// The sensitivity used to calibrate the noise of a linear model with `dim` parameters.
///
/// This is a heuristic rather than a proven bound: `2 * sqrt(d) / lambda` for ridge models and
/// `2 * (d + 1)²` otherwise, unless the spec pins a value.
pub fn sensitivity(spec: &LocalModelSpec, dim: usize) -> f64 {
    if let Some(sensitivity) = spec.sensitivity {
        return sensitivity;
    }

    match spec.regularization {
        RegularizationSpec::L2 { lambda } if lambda > 0. => 2. * (dim as f64).sqrt() / lambda,
        _ => 2. * ((dim + 1) as f64).powi(2),
    }
}

#[cfg(test)]
mod tests {
    use comms::specs::machine_learning::ObjectiveSpec;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn laplace_moments() {
        const N: usize = 20_000;
        let scale = 2.;
        let noise = LaplaceNoise::new(1., 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let samples: Vec<f64> = (0..N).map(|_| noise.sample(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / N as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / N as f64;

        assert!(mean.abs() < 0.05 * scale);
        assert!((var / (2. * scale * scale) - 1.).abs() < 0.1);
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        assert!(LaplaceNoise::new(1., 0.).is_err());
        assert!(LaplaceNoise::new(1., -1.).is_err());
        assert!(LaplaceNoise::new(f64::INFINITY, 1.).is_err());
    }

    #[test]
    fn sensitivity_follows_the_regularization() {
        let ridge =
            LocalModelSpec::new(ObjectiveSpec::Logistic, RegularizationSpec::L2 { lambda: 2. });
        assert_eq!(sensitivity(&ridge, 4), 2.);

        let plain = LocalModelSpec::new(ObjectiveSpec::LeastSquares, RegularizationSpec::None);
        assert_eq!(sensitivity(&plain, 2), 18.);

        let pinned = LocalModelSpec {
            sensitivity: Some(0.5),
            ..plain
        };
        assert_eq!(sensitivity(&pinned, 2), 0.5);
    }
}
