use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{ParamGen, Result};

/// Draws every coordinate independently from a distribution.
pub struct RandParamGen<R: Rng, D: Distribution<f64>> {
    rng: R,
    distribution: D,
}

impl<R: Rng, D: Distribution<f64>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen`.
    ///
    /// # Arguments
    /// * `rng` - The random number generator, owned so a seeded one makes the draw reproducible.
    /// * `distribution` - The distribution of every coordinate.
    pub fn new(rng: R, distribution: D) -> Self {
        Self { rng, distribution }
    }
}

impl<R: Rng> RandParamGen<R, Normal<f64>> {
    /// Creates a new `RandParamGen` over `N(mean, std_dev²)`.
    ///
    /// # Returns
    /// An error if `std_dev` is negative or not finite.
    pub fn normal(rng: R, mean: f64, std_dev: f64) -> Result<Self> {
        Ok(Self::new(rng, Normal::new(mean, std_dev)?))
    }
}

impl<R: Rng, D: Distribution<f64>> ParamGen for RandParamGen<R, D> {
    fn generate(&mut self, dim: usize) -> Array1<f64> {
        Array1::from_iter((&self.distribution).sample_iter(&mut self.rng).take(dim))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn same_seed_same_parameters() {
        let draw = |seed| {
            let rng = StdRng::seed_from_u64(seed);
            RandParamGen::normal(rng, 0., 1.).unwrap().generate(8)
        };

        assert_eq!(draw(7), draw(7));
        assert_ne!(draw(7), draw(8));
    }

    #[test]
    fn consecutive_draws_differ() {
        let rng = StdRng::seed_from_u64(42);
        let mut param_gen = RandParamGen::normal(rng, 0., 1.).unwrap();

        let first = param_gen.generate(4);
        assert_eq!(first.len(), 4);
        assert_ne!(first, param_gen.generate(4));
    }

    #[test]
    fn degenerate_normal_is_constant() {
        let rng = StdRng::seed_from_u64(1);
        let w = RandParamGen::normal(rng, 2., 0.).unwrap().generate(3);
        assert!(w.iter().all(|v| *v == 2.));
    }

    #[test]
    fn invalid_std_dev_is_rejected() {
        let rng = StdRng::seed_from_u64(42);
        assert!(RandParamGen::normal(rng, 0., f64::NAN).is_err());
    }
}
