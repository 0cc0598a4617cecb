use std::num::NonZeroUsize;

use comms::specs::federation::FederationSpec;
use machine_learning::{model::LocalModel, optimization::shared_coordinates};

use crate::{FederatedFit, FederationCoordinator, FederationErr, Result};

/// Builds `FederationCoordinator`s given a specification.
#[derive(Default)]
pub struct CoordinatorBuilder;

impl CoordinatorBuilder {
    /// Creates a new `CoordinatorBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a coordinator following a spec and registers `models` in order.
    ///
    /// # Args
    /// * `spec` - The specification of the federated fit.
    /// * `models` - The local models, their order fixes the round robin order.
    ///
    /// # Returns
    /// A new coordinator or an error if the spec or any model is invalid.
    pub fn build<I>(&self, spec: &FederationSpec, models: I) -> Result<FederationCoordinator>
    where
        I: IntoIterator<Item = LocalModel>,
    {
        let max_evals = NonZeroUsize::new(spec.max_evals)
            .ok_or(FederationErr::InvalidInput("max evals must be positive"))?;

        if !(spec.opt_tol.is_finite() && spec.opt_tol > 0.) {
            return Err(FederationErr::InvalidInput("opt tol must be positive"));
        }

        let mut coordinator = FederationCoordinator::new(max_evals, spec.opt_tol);
        for model in models {
            coordinator.add_model(model)?;
        }

        if let Some(dim) = coordinator.dim() {
            shared_coordinates(dim, spec.theta)?;
        }

        Ok(coordinator)
    }

    /// Builds a coordinator and runs the federated fit with the spec's `theta`.
    ///
    /// # Args
    /// * `spec` - The specification of the federated fit.
    /// * `models` - The local models, in round robin order.
    ///
    /// # Returns
    /// The fitted coordinator and the fit report.
    pub fn fit<I>(
        &self,
        spec: &FederationSpec,
        models: I,
    ) -> Result<(FederationCoordinator, FederatedFit)>
    where
        I: IntoIterator<Item = LocalModel>,
    {
        let mut coordinator = self.build(spec, models)?;
        let fit = coordinator.fit(spec.theta)?;
        Ok((coordinator, fit))
    }
}
