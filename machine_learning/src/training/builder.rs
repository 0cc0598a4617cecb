use std::num::NonZeroUsize;

use comms::specs::machine_learning::{
    LocalModelSpec, MinimizerSpec, ParamInitSpec, RegularizationSpec,
};
use ndarray::Array1;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    MlErr, Result,
    dataset::Partition,
    initialization::{ConstParamGen, ParamGen, RandParamGen},
    model::LocalModel,
    optimization::LineSearch,
};

/// Builds `LocalModel`s given a specification.
#[derive(Default)]
pub struct LocalModelBuilder;

impl LocalModelBuilder {
    /// Creates a new `LocalModelBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new unfitted `LocalModel` following a spec.
    ///
    /// # Args
    /// * `spec` - The specification of the model.
    /// * `partition` - The client's data, owned by the model from now on.
    ///
    /// # Returns
    /// A new model or an error if the spec is invalid.
    pub fn build(&self, spec: LocalModelSpec, partition: Partition) -> Result<LocalModel> {
        let line_search = self.resolve_minimizer(&spec.minimizer)?;
        self.check_regularization(spec.regularization)?;
        let w = self.resolve_init(&spec, partition.dim())?;
        LocalModel::new(spec, partition, line_search, w)
    }

    /// Builds and fits a `LocalModel` in one go.
    ///
    /// # Args
    /// * `spec` - The specification of the model.
    /// * `partition` - The client's data.
    ///
    /// # Returns
    /// The fitted model or the first error encountered.
    pub fn fit(&self, spec: LocalModelSpec, partition: Partition) -> Result<LocalModel> {
        let mut model = self.build(spec, partition)?;
        model.fit()?;
        Ok(model)
    }

    /// Generates a random number generator given (or not) a seed.
    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn resolve_minimizer(&self, spec: &MinimizerSpec) -> Result<LineSearch> {
        let max_evals = NonZeroUsize::new(spec.max_evals).ok_or(MlErr::InvalidParameter {
            what: "max evals",
            value: 0.,
        })?;

        for (what, value) in [("opt tol", spec.opt_tol), ("gamma", spec.gamma)] {
            if !(value.is_finite() && value > 0.) {
                return Err(MlErr::InvalidParameter { what, value });
            }
        }

        Ok(LineSearch::new(max_evals, spec.opt_tol, spec.gamma))
    }

    fn check_regularization(&self, spec: RegularizationSpec) -> Result<()> {
        let lambda = spec.lambda();
        if !(lambda.is_finite() && lambda >= 0.) {
            return Err(MlErr::InvalidParameter {
                what: "lambda",
                value: lambda,
            });
        }

        Ok(())
    }

    /// Resolves the initial parameters of the model.
    ///
    /// # Args
    /// * `spec` - The specification of the model.
    /// * `dim` - The amount of parameters to generate.
    ///
    /// # Returns
    /// The initial parameters or an error if the distribution is invalid.
    fn resolve_init(&self, spec: &LocalModelSpec, dim: usize) -> Result<Array1<f64>> {
        let w = match spec.init {
            ParamInitSpec::Const { value } => ConstParamGen::new(value).generate(dim),
            ParamInitSpec::Normal { mean, std_dev } => {
                let rng = self.generate_rng(spec.seed);
                RandParamGen::normal(rng, mean, std_dev)
                    .map_err(|_| MlErr::InvalidParameter {
                        what: "init std dev",
                        value: std_dev,
                    })?
                    .generate(dim)
            }
        };

        Ok(w)
    }
}

#[cfg(test)]
mod tests {
    use comms::specs::machine_learning::ObjectiveSpec;
    use ndarray::{Array2, array};

    use super::*;

    fn partition() -> Partition {
        let x = Array2::from_shape_fn((6, 3), |(i, j)| if j == 0 { 1. } else { (i + j) as f64 });
        let y = array![1., 1., -1., 1., -1., -1.];
        Partition::new(x, y).unwrap()
    }

    #[test]
    fn default_init_is_zeros() {
        let spec = LocalModelSpec::new(ObjectiveSpec::Logistic, RegularizationSpec::None);
        let model = LocalModelBuilder::new().build(spec, partition()).unwrap();

        assert_eq!(model.params(), Array1::<f64>::zeros(3));
        assert_eq!(model.step(), 1.);
    }

    #[test]
    fn seeded_normal_init_is_reproducible() {
        let spec = LocalModelSpec {
            init: ParamInitSpec::Normal {
                mean: 0.,
                std_dev: 1.,
            },
            seed: Some(5),
            ..LocalModelSpec::new(ObjectiveSpec::Logistic, RegularizationSpec::L2 { lambda: 1. })
        };

        let builder = LocalModelBuilder::new();
        let a = builder.build(spec.clone(), partition()).unwrap();
        let b = builder.build(spec, partition()).unwrap();

        assert_eq!(a.params(), b.params());
        assert!(a.params().iter().any(|w| *w != 0.));
    }

    #[test]
    fn zero_budget_is_rejected() {
        let spec = LocalModelSpec::new(ObjectiveSpec::LeastSquares, RegularizationSpec::None)
            .with_max_evals(0);

        assert!(matches!(
            LocalModelBuilder::new().build(spec, partition()),
            Err(MlErr::InvalidParameter { what: "max evals", .. })
        ));
    }

    #[test]
    fn negative_lambda_is_rejected() {
        let spec =
            LocalModelSpec::new(ObjectiveSpec::LeastSquares, RegularizationSpec::L1 { lambda: -1. });

        assert!(LocalModelBuilder::new().build(spec, partition()).is_err());
    }
}
