use comms::specs::machine_learning::LocalModelSpec;
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{
    MlErr, Result,
    dataset::Partition,
    model::LocalModel,
    training::LocalModelBuilder,
};

/// What a backend reports after fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    /// The training error of the fitted model.
    pub error: f64,
    pub sample_size: usize,
}

/// The minimal contract a training engine offers to a client session.
pub trait Backend {
    /// Fits a model on `(x, y)`, replacing whatever was fitted before.
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<TrainingSummary>;

    /// Predicts with the last fitted model.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;
}

/// A `Backend` fitting this crate's linear `LocalModel`s.
pub struct LinearBackend {
    spec: LocalModelSpec,
    model: Option<LocalModel>,
}

impl LinearBackend {
    pub fn new(spec: LocalModelSpec) -> Self {
        Self { spec, model: None }
    }

    pub fn into_model(self) -> Option<LocalModel> {
        self.model
    }
}

impl Backend for LinearBackend {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<TrainingSummary> {
        let partition = Partition::new(x.to_owned(), y.to_owned())?;
        let model = LocalModelBuilder::new().fit(self.spec.clone(), partition)?;

        let summary = TrainingSummary {
            error: model.training_error()?,
            sample_size: model.len(),
        };

        self.model = Some(model);
        Ok(summary)
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.model.as_ref().ok_or(MlErr::NotFitted)?.predict(x)
    }
}
