use comms::{
    ModelBlob,
    specs::machine_learning::{LocalModelSpec, RegularizationSpec},
};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;

use super::{LinearPredictor, selection};
use crate::{
    MlErr, Result,
    dataset::Partition,
    objective::{LossFn, Objective, Ridge},
    optimization::{LineSearch, Penalty, SparseUpdate, SparseUpdateProducer, Termination},
};

/// What a call to `LocalModel::fit` achieved.
#[derive(Debug, Clone, Copy)]
pub struct FitSummary {
    pub loss: f64,
    pub opt_cond: f64,
    pub evals: usize,
    pub termination: Termination,
}

/// What a call to `LocalModel::one_gradient_step` achieved.
#[derive(Debug, Clone, Copy)]
pub struct GradientStep {
    pub loss: f64,
    pub opt_cond: f64,
    pub converged: bool,
}

/// A linear model owning one client's data partition.
///
/// Training data never leaves this struct: the coordinator only sees sparse updates, predictions
/// and the `LinearPredictor` returned by `release`.
#[derive(Debug, Clone)]
pub struct LocalModel {
    partition: Partition,
    objective: Ridge<Objective>,
    line_search: LineSearch,
    predictor: LinearPredictor,
}

impl LocalModel {
    pub(crate) fn new(
        spec: LocalModelSpec,
        partition: Partition,
        line_search: LineSearch,
        w: Array1<f64>,
    ) -> Result<Self> {
        if w.len() != partition.dim() {
            return Err(MlErr::SizeMismatch {
                what: "initial parameters",
                got: w.len(),
                expected: partition.dim(),
            });
        }

        let ridge = match spec.regularization {
            RegularizationSpec::L2 { lambda } => lambda,
            _ => 0.,
        };
        let objective = Ridge::new(Objective::from(spec.objective), ridge);

        Ok(Self {
            partition,
            objective,
            line_search,
            predictor: LinearPredictor::new(spec, w, 1.),
        })
    }

    pub fn spec(&self) -> &LocalModelSpec {
        self.predictor.spec()
    }

    pub fn params(&self) -> ArrayView1<'_, f64> {
        self.predictor.params()
    }

    /// Replaces the parameters, keeping the carried step.
    pub fn set_params(&mut self, w: Array1<f64>) -> Result<()> {
        if w.len() != self.dim() {
            return Err(MlErr::SizeMismatch {
                what: "parameters",
                got: w.len(),
                expected: self.dim(),
            });
        }

        let step = self.step();
        self.predictor.set_state(w, step);
        Ok(())
    }

    /// The step size the next minimization starts from.
    pub fn step(&self) -> f64 {
        self.predictor.step()
    }

    pub fn dim(&self) -> usize {
        self.partition.dim()
    }

    /// The amount of samples this model is trained on.
    pub fn len(&self) -> usize {
        self.partition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partition.is_empty()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn line_search(&self) -> &LineSearch {
        &self.line_search
    }

    /// The smooth objective of this model, ridge penalty included.
    pub fn objective(&self) -> &Ridge<Objective> {
        &self.objective
    }

    pub fn is_classification(&self) -> bool {
        self.predictor.is_classification()
    }

    /// The non smooth part of this model's objective, only L1 models have one.
    pub fn penalty(&self) -> Penalty {
        match self.spec().regularization {
            RegularizationSpec::L1 { lambda } => Penalty::L1(lambda),
            _ => Penalty::None,
        }
    }

    /// Fits the model on its own partition starting from the current parameters.
    ///
    /// L1 models use proximal steps, L0 models run forward selection and every other model
    /// minimizes its smooth objective directly.
    pub fn fit(&mut self) -> Result<FitSummary> {
        let (x, y) = (self.partition.x(), self.partition.y());
        let w = self.predictor.params().to_owned();
        let step = self.step();

        let report = match self.spec().regularization {
            RegularizationSpec::L1 { lambda } => {
                self.line_search
                    .minimize_l1(&self.objective, lambda, w, step, x, y)?
            }
            RegularizationSpec::L0 { lambda } => {
                selection::forward_select(&self.line_search, &self.objective, lambda, x, y)?
            }
            RegularizationSpec::None | RegularizationSpec::L2 { .. } => {
                self.line_search.minimize(&self.objective, w, step, x, y)?
            }
        };

        self.predictor.set_state(report.w, report.step);

        Ok(FitSummary {
            loss: report.loss,
            opt_cond: report.opt_cond,
            evals: report.evals,
            termination: report.termination,
        })
    }

    /// Takes one accepted line search step from the current parameters, carrying the step size.
    ///
    /// L1 models take a proximal step, so coordinates the penalty zeroes stay at zero.
    pub fn one_gradient_step(&mut self) -> Result<GradientStep> {
        let (x, y) = (self.partition.x(), self.partition.y());
        let penalty = self.penalty();
        let report = self.line_search.step(
            &self.objective,
            penalty,
            self.params(),
            self.step(),
            x,
            y,
        )?;

        let opt_cond = penalty.opt_cond(report.w.view(), report.grad.view());
        self.predictor.set_state(report.w, report.next_step);

        Ok(GradientStep {
            loss: report.loss,
            opt_cond,
            converged: opt_cond < self.line_search.opt_tol(),
        })
    }

    /// Computes the sparse update this client shares for the shared parameters `w`.
    ///
    /// # Arguments
    /// * `theta` - The fraction of coordinates to share.
    /// * `w` - The shared parameters, they are not modified.
    pub fn private_fun(&self, theta: f64, w: ArrayView1<f64>) -> Result<SparseUpdate> {
        if w.len() != self.dim() {
            return Err(MlErr::SizeMismatch {
                what: "shared parameters",
                got: w.len(),
                expected: self.dim(),
            });
        }

        let (x, y) = (self.partition.x(), self.partition.y());
        SparseUpdateProducer::new(&self.line_search).produce(
            &self.objective,
            self.penalty(),
            theta,
            w,
            x,
            y,
        )
    }

    /// The smooth objective and its gradient at `w` over this model's partition.
    pub fn loss_grad(&self, w: ArrayView1<f64>) -> Result<(f64, Array1<f64>)> {
        if w.len() != self.dim() {
            return Err(MlErr::SizeMismatch {
                what: "parameters",
                got: w.len(),
                expected: self.dim(),
            });
        }

        Ok(self
            .objective
            .loss_grad(w, self.partition.x(), self.partition.y()))
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.predictor.predict(x)
    }

    pub fn private_predict<R: Rng + ?Sized>(
        &self,
        x: ArrayView2<f64>,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Array1<f64>> {
        self.predictor.private_predict(x, epsilon, rng)
    }

    /// The error of this model over its own training partition.
    pub fn training_error(&self) -> Result<f64> {
        self.predictor.error(self.partition.x(), self.partition.y())
    }

    /// The releasable part of this model.
    pub fn release(&self) -> LinearPredictor {
        self.predictor.clone()
    }

    pub fn to_blob(&self) -> Result<ModelBlob> {
        self.predictor.to_blob()
    }
}
