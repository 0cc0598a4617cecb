use std::num::NonZeroUsize;

use comms::specs::machine_learning::LocalModelSpec;
use log::{debug, info};
use machine_learning::{
    dataset::Partition,
    model::{LocalModel, sign},
    optimization::{Termination, shared_coordinates},
    training::LocalModelBuilder,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;

use crate::{FederationErr, Result, aggregation::solve_normal_equations, storage::SharedParams};

/// What a federated fit achieved.
#[derive(Debug, Clone, Copy)]
pub struct FederatedFit {
    /// The loss the last visited client reported.
    pub loss: f64,
    pub opt_cond: f64,
    /// The amount of client rounds run.
    pub evals: usize,
    pub termination: Termination,
}

/// Owns the registered local models and every way of combining them into a global model.
#[derive(Debug)]
pub struct FederationCoordinator {
    models: Vec<LocalModel>,
    max_evals: NonZeroUsize,
    opt_tol: f64,
    shared: Option<SharedParams>,
    combination: Option<Array1<f64>>,
}

impl FederationCoordinator {
    /// Creates a new `FederationCoordinator` without models.
    ///
    /// # Arguments
    /// * `max_evals` - The maximum amount of client rounds of a federated fit.
    /// * `opt_tol` - The gradient infinity norm under which a federated fit stops.
    pub fn new(max_evals: NonZeroUsize, opt_tol: f64) -> Self {
        Self {
            models: Vec::new(),
            max_evals,
            opt_tol,
            shared: None,
            combination: None,
        }
    }

    /// Registers a model.
    ///
    /// # Returns
    /// `DimensionMismatch` if its dimension differs from the registered models', or an invalid
    /// input error if it doesn't share their objective kind.
    pub fn add_model(&mut self, model: LocalModel) -> Result<()> {
        if let Some(first) = self.models.first() {
            if model.dim() != first.dim() {
                return Err(FederationErr::DimensionMismatch {
                    got: model.dim(),
                    expected: first.dim(),
                });
            }

            if model.is_classification() != first.is_classification() {
                return Err(FederationErr::InvalidInput(
                    "can't mix classifiers and regressors",
                ));
            }
        }

        info!(models = self.models.len() + 1, dim = model.dim(); "registered local model");
        self.models.push(model);
        self.combination = None;
        Ok(())
    }

    pub fn models(&self) -> &[LocalModel] {
        &self.models
    }

    /// Mutable access, used to fit the models individually.
    pub fn models_mut(&mut self) -> &mut [LocalModel] {
        &mut self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The dimension shared by every registered model.
    pub fn dim(&self) -> Option<usize> {
        self.models.first().map(LocalModel::dim)
    }

    fn is_classification(&self) -> bool {
        self.models.first().is_some_and(LocalModel::is_classification)
    }

    /// The shared parameters of the last federated fit.
    pub fn shared_params(&self) -> Option<ArrayView1<'_, f64>> {
        self.shared.as_ref().map(SharedParams::params)
    }

    /// The combination weights of the last weighted average fit.
    pub fn combination(&self) -> Option<ArrayView1<'_, f64>> {
        self.combination.as_ref().map(|c| c.view())
    }

    /// Fits the shared parameters from zero by visiting the models in registration order.
    ///
    /// Each round the visited model computes a sparse update against the shared parameters,
    /// which is added to them. The fit stops once the optimality measure that model reported is
    /// under `opt_tol`, or after `max_evals` rounds.
    ///
    /// # Arguments
    /// * `theta` - The fraction of coordinates every update shares.
    pub fn fit(&mut self, theta: f64) -> Result<FederatedFit> {
        let dim = self.dim().ok_or(FederationErr::NoModels)?;
        shared_coordinates(dim, theta)?;

        let max_evals = self.max_evals.get();
        let mut shared = SharedParams::new(dim);
        let mut evals = 0;
        let mut loss = f64::NAN;
        let mut opt_cond = f64::INFINITY;

        info!(models = self.models.len(), theta, max_evals; "starting federated fit");

        let termination = loop {
            if evals >= max_evals {
                break Termination::BudgetExhausted;
            }

            let model = &self.models[evals % self.models.len()];
            let update = model.private_fun(theta, shared.params())?;
            shared.accumulate(update.delta.view())?;
            evals += 1;

            loss = update.loss;
            opt_cond = update.opt_cond;
            if opt_cond < self.opt_tol {
                break Termination::Converged;
            }
        };

        info!(evals, opt_cond, converged = termination == Termination::Converged; "federated fit finished");
        self.shared = Some(shared);

        Ok(FederatedFit {
            loss,
            opt_cond,
            evals,
            termination,
        })
    }

    fn finish(&self, mut z: Array1<f64>) -> Array1<f64> {
        if self.is_classification() {
            z.mapv_inplace(sign);
        }

        z
    }

    /// Predicts with the shared parameters of the last federated fit.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let w = self
            .shared_params()
            .ok_or(FederationErr::NotFitted("shared model"))?;

        if x.ncols() != w.len() {
            return Err(FederationErr::SizeMismatch {
                what: "prediction features",
                got: x.ncols(),
                expected: w.len(),
            });
        }

        Ok(self.finish(x.dot(&w)))
    }

    /// Collects one column of predictions per model.
    fn predictions<F>(&self, x: ArrayView2<f64>, mut predict: F) -> Result<Array2<f64>>
    where
        F: FnMut(&LocalModel, ArrayView2<f64>) -> machine_learning::Result<Array1<f64>>,
    {
        if self.models.is_empty() {
            return Err(FederationErr::NoModels);
        }

        let mut m = Array2::zeros((x.nrows(), self.models.len()));
        for (model, mut column) in self.models.iter().zip(m.columns_mut()) {
            column.assign(&predict(model, x)?);
        }

        Ok(m)
    }

    fn average(&self, m: Array2<f64>) -> Array1<f64> {
        let k = m.ncols() as f64;
        let z = m.sum_axis(ndarray::Axis(1)) / k;
        self.finish(z)
    }

    /// Averages the predictions of every model with its own parameters.
    pub fn predict_average(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let m = self.predictions(x, LocalModel::predict)?;
        Ok(self.average(m))
    }

    /// Averages the privately released predictions of every model.
    ///
    /// # Arguments
    /// * `x` - The features to predict.
    /// * `epsilon` - The privacy budget of every model's release.
    /// * `rng` - The noise source.
    pub fn private_predict_average<R: Rng + ?Sized>(
        &self,
        x: ArrayView2<f64>,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Array1<f64>> {
        let m = self.predictions(x, |model, x| model.private_predict(x, epsilon, &mut *rng))?;
        Ok(self.average(m))
    }

    fn solve_combination(&mut self, m: Array2<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>> {
        let weights = solve_normal_equations(m.view(), y)?;
        debug!("combination weights {weights}");
        self.combination = Some(weights.clone());
        Ok(weights)
    }

    /// Learns least squares combination weights of the models' predictions over `(x, y)`.
    ///
    /// # Returns
    /// The weights, or `IllConditioned` if the predictions are collinear.
    pub fn fit_weighted_average(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Array1<f64>> {
        let m = self.predictions(x, LocalModel::predict)?;
        self.solve_combination(m, y)
    }

    /// Like `fit_weighted_average`, but learns from privately released predictions.
    pub fn private_fit_weighted_average<R: Rng + ?Sized>(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Array1<f64>> {
        let m = self.predictions(x, |model, x| model.private_predict(x, epsilon, &mut *rng))?;
        self.solve_combination(m, y)
    }

    /// Combines the models' predictions with the learned weights.
    ///
    /// # Arguments
    /// * `x` - The features to predict.
    /// * `logistic` - Whether to threshold the combination with `sign`.
    pub fn predict_weighted_average(
        &self,
        x: ArrayView2<f64>,
        logistic: bool,
    ) -> Result<Array1<f64>> {
        let weights = self
            .combination
            .as_ref()
            .ok_or(FederationErr::NotFitted("weighted average"))?;

        let m = self.predictions(x, LocalModel::predict)?;
        let mut z = m.dot(weights);
        if logistic {
            z.mapv_inplace(sign);
        }

        Ok(z)
    }

    /// Votes on the features to keep: coordinate `j` is kept when fewer than `min_votes` models
    /// zeroed it.
    pub fn select_features(&self, min_votes: usize) -> Result<Vec<usize>> {
        let dim = self.dim().ok_or(FederationErr::NoModels)?;

        let selected = (0..dim)
            .filter(|&j| {
                let votes = self.models.iter().filter(|m| m.params()[j] == 0.).count();
                votes < min_votes
            })
            .collect();

        Ok(selected)
    }

    /// Fits a fresh model on public data labelled by the models' averaged predictions.
    ///
    /// # Arguments
    /// * `x_public` - Unlabelled public features.
    /// * `epsilon` - The privacy budget of the labelling, `None` labels without noise.
    /// * `spec` - The specification of the student model.
    /// * `rng` - The noise source.
    ///
    /// # Returns
    /// The fitted student model.
    pub fn knowledge_transfer<R: Rng + ?Sized>(
        &self,
        x_public: ArrayView2<f64>,
        epsilon: Option<f64>,
        spec: LocalModelSpec,
        rng: &mut R,
    ) -> Result<LocalModel> {
        let mut labels = match epsilon {
            Some(epsilon) => self.private_predict_average(x_public, epsilon, rng)?,
            None => self.predict_average(x_public)?,
        };

        // A tied vote is not a usable label.
        if spec.objective.is_classification() {
            labels.mapv_inplace(|l| if l == 0. { 1. } else { l });
        }

        let partition = Partition::new(x_public.to_owned(), labels)?;
        Ok(LocalModelBuilder::new().fit(spec, partition)?)
    }
}

#[cfg(test)]
mod tests {
    use comms::specs::machine_learning::{ObjectiveSpec, RegularizationSpec};
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn coordinator() -> FederationCoordinator {
        FederationCoordinator::new(NonZeroUsize::new(50).unwrap(), 1e-2)
    }

    fn model(x: Array2<f64>, y: Array1<f64>, objective: ObjectiveSpec) -> LocalModel {
        let spec = LocalModelSpec::new(objective, RegularizationSpec::L2 { lambda: 1. });
        LocalModelBuilder::new()
            .build(spec, Partition::new(x, y).unwrap())
            .unwrap()
    }

    fn classifier(shift: f64) -> LocalModel {
        let x = array![[1., -2. + shift], [1., -1. + shift], [1., 1. + shift], [1., 2. + shift]];
        model(x, array![-1., -1., 1., 1.], ObjectiveSpec::Logistic)
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let mut coordinator = coordinator();
        coordinator.add_model(classifier(0.)).unwrap();

        let x = Array2::ones((2, 3));
        let other = model(x, array![1., -1.], ObjectiveSpec::Logistic);
        assert!(matches!(
            coordinator.add_model(other),
            Err(FederationErr::DimensionMismatch {
                got: 3,
                expected: 2
            })
        ));
        assert_eq!(coordinator.len(), 1);
    }

    #[test]
    fn mixed_objectives_are_rejected() {
        let mut coordinator = coordinator();
        coordinator.add_model(classifier(0.)).unwrap();

        let regressor = model(array![[1., 0.]], array![0.5], ObjectiveSpec::LeastSquares);
        assert!(coordinator.add_model(regressor).is_err());
    }

    #[test]
    fn fit_without_models_fails() {
        assert!(matches!(coordinator().fit(1.), Err(FederationErr::NoModels)));
    }

    #[test]
    fn predict_before_fit_fails() {
        let mut coordinator = coordinator();
        coordinator.add_model(classifier(0.)).unwrap();

        assert!(matches!(
            coordinator.predict(array![[1., 0.]].view()),
            Err(FederationErr::NotFitted(_))
        ));
    }

    #[test]
    fn short_budget_visits_the_first_clients_only() {
        let mut coordinator = FederationCoordinator::new(NonZeroUsize::new(1).unwrap(), 1e-12);
        coordinator.add_model(classifier(0.)).unwrap();
        coordinator.add_model(classifier(0.5)).unwrap();

        let fit = coordinator.fit(1.).unwrap();
        assert_eq!(fit.evals, 1);

        let first = coordinator.models()[0]
            .private_fun(1., Array1::zeros(2).view())
            .unwrap();
        assert_eq!(coordinator.shared_params().unwrap(), first.delta);
    }

    #[test]
    fn invalid_theta_is_rejected() {
        let mut coordinator = coordinator();
        coordinator.add_model(classifier(0.)).unwrap();

        assert!(coordinator.fit(1.5).is_err());
    }

    #[test]
    fn average_of_one_model_is_its_prediction() {
        let mut coordinator = coordinator();
        let mut model = classifier(0.);
        model.fit().unwrap();
        coordinator.add_model(model).unwrap();

        let x = array![[1., -3.], [1., 3.]];
        let expected = coordinator.models()[0].predict(x.view()).unwrap();
        assert_eq!(coordinator.predict_average(x.view()).unwrap(), expected);
    }

    #[test]
    fn feature_votes_count_zeroed_coordinates() {
        let mut coordinator = coordinator();
        for params in [array![1., 0.], array![2., 0.], array![0., 3.]] {
            let mut model = classifier(0.);
            model.set_params(params).unwrap();
            coordinator.add_model(model).unwrap();
        }

        assert_eq!(coordinator.select_features(2).unwrap(), [0]);
        assert_eq!(coordinator.select_features(3).unwrap(), [0, 1]);
        assert!(coordinator.select_features(0).unwrap().is_empty());
    }

    #[test]
    fn weighted_average_before_fit_fails() {
        let mut coordinator = coordinator();
        coordinator.add_model(classifier(0.)).unwrap();

        assert!(matches!(
            coordinator.predict_weighted_average(array![[1., 0.]].view(), true),
            Err(FederationErr::NotFitted(_))
        ));
    }

    #[test]
    fn knowledge_transfer_fits_a_student() {
        let mut coordinator = coordinator();
        for shift in [0., 0.25] {
            let mut model = classifier(shift);
            model.fit().unwrap();
            coordinator.add_model(model).unwrap();
        }

        let x_public = array![[1., -2.], [1., -0.5], [1., 0.5], [1., 2.]];
        let spec = LocalModelSpec::new(ObjectiveSpec::Logistic, RegularizationSpec::L2 { lambda: 1. });
        let mut rng = StdRng::seed_from_u64(0);

        let student = coordinator
            .knowledge_transfer(x_public.view(), None, spec, &mut rng)
            .unwrap();
        assert_eq!(student.len(), 4);
        assert!(student.params()[1] > 0.);
    }
}
