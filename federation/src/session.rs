use comms::{ModelBlob, specs::machine_learning::LocalModelSpec};
use log::debug;
use machine_learning::{
    backend::{Backend, LinearBackend},
    dataset::{DatasetSource, DatasetSplit, Partition},
    metrics,
    model::LinearPredictor,
};

use crate::{FederationErr, Result, WeightedEnsemble};

/// What a client sends back after training: the released model and how it did on its data.
#[derive(Debug, Clone)]
pub struct Commit {
    pub blob: ModelBlob,
    pub error: f64,
    pub size: usize,
}

/// The error of a model over one of the client's datasets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorReport {
    pub error: f64,
    pub size: usize,
}

/// A client's local state between calls: its training and test data.
#[derive(Debug, Default)]
pub struct ClientSession {
    data: Option<(Partition, Partition)>,
}

impl ClientSession {
    /// Creates a new empty `ClientSession`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the session data with `split`.
    pub fn load(&mut self, split: DatasetSplit) -> Result<()> {
        self.data = Some((split.train()?, split.validation()?));
        debug!("client session loaded {} training samples", split.y.len());
        Ok(())
    }

    /// Replaces the session data with the dataset `name` of `source`.
    pub fn read<S: DatasetSource>(&mut self, source: &S, name: &str) -> Result<()> {
        let split = source.load(name)?;
        self.load(split)
    }

    /// Drops the session data.
    pub fn reset(&mut self) {
        self.data = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    fn data(&self) -> Result<&(Partition, Partition)> {
        self.data.as_ref().ok_or(FederationErr::NoData)
    }

    /// Trains a model on the training data and releases it.
    ///
    /// # Arguments
    /// * `spec` - The specification of the model to train.
    pub fn train(&self, spec: &LocalModelSpec) -> Result<Commit> {
        let (train, _) = self.data()?;
        let mut backend = LinearBackend::new(spec.clone());
        let summary = backend.fit(train.x(), train.y())?;

        let model = backend.into_model().ok_or(FederationErr::NotFitted("client model"))?;
        Ok(Commit {
            blob: model.to_blob()?,
            error: summary.error,
            size: summary.sample_size,
        })
    }

    fn local_error(blob: &ModelBlob, data: &Partition) -> Result<ErrorReport> {
        let predictor = LinearPredictor::from_blob(blob)?;
        Ok(ErrorReport {
            error: predictor.error(data.x(), data.y())?,
            size: data.len(),
        })
    }

    fn global_error(ensemble: &WeightedEnsemble, data: &Partition) -> Result<f64> {
        let y_hat = ensemble.predict(data.x())?;
        Ok(metrics::classification_error(data.y(), y_hat.view())?)
    }

    /// The error of a committed model over the training data.
    pub fn train_error_local(&self, blob: &ModelBlob) -> Result<ErrorReport> {
        Self::local_error(blob, &self.data()?.0)
    }

    /// The error of a committed model over the test data.
    pub fn test_error_local(&self, blob: &ModelBlob) -> Result<ErrorReport> {
        Self::local_error(blob, &self.data()?.1)
    }

    /// The classification error of a global ensemble over the training data.
    pub fn train_error_global(&self, ensemble: &WeightedEnsemble) -> Result<f64> {
        Self::global_error(ensemble, &self.data()?.0)
    }

    /// The classification error of a global ensemble over the test data.
    pub fn test_error_global(&self, ensemble: &WeightedEnsemble) -> Result<f64> {
        Self::global_error(ensemble, &self.data()?.1)
    }
}
