use comms::{ModelBlob, ModelState, specs::machine_learning::LocalModelSpec};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::Distribution;

use super::privacy::{self, LaplaceNoise};
use crate::{MlErr, Result, metrics};

/// The sign of `v`, zero stays zero.
pub fn sign(v: f64) -> f64 {
    if v > 0. {
        1.
    } else if v < 0. {
        -1.
    } else {
        0.
    }
}

/// A fitted linear model stripped of its training data, what a client releases.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    spec: LocalModelSpec,
    w: Array1<f64>,
    step: f64,
}

impl LinearPredictor {
    pub(crate) fn new(spec: LocalModelSpec, w: Array1<f64>, step: f64) -> Self {
        Self { spec, w, step }
    }

    /// Decodes a predictor from a released blob.
    pub fn from_blob(blob: &ModelBlob) -> Result<Self> {
        let ModelState { spec, step, params } = blob.decode()?;
        Ok(Self::new(spec, Array1::from(params), step))
    }

    /// Encodes this predictor, only the spec, the step and the parameters leave the process.
    pub fn to_blob(&self) -> Result<ModelBlob> {
        let state = ModelState {
            spec: self.spec.clone(),
            step: self.step,
            params: self.w.to_vec(),
        };

        Ok(ModelBlob::encode(&state)?)
    }

    pub fn spec(&self) -> &LocalModelSpec {
        &self.spec
    }

    pub fn params(&self) -> ArrayView1<'_, f64> {
        self.w.view()
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn dim(&self) -> usize {
        self.w.len()
    }

    pub fn is_classification(&self) -> bool {
        self.spec.objective.is_classification()
    }

    pub(crate) fn set_state(&mut self, w: Array1<f64>, step: f64) {
        self.w = w;
        self.step = step;
    }

    fn scores(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.dim() {
            return Err(MlErr::SizeMismatch {
                what: "prediction features",
                got: x.ncols(),
                expected: self.dim(),
            });
        }

        Ok(x.dot(&self.w))
    }

    fn finish(&self, mut z: Array1<f64>) -> Array1<f64> {
        if self.is_classification() {
            z.mapv_inplace(sign);
        }

        z
    }

    /// Predicts `Xw`, thresholded with `sign` for classifiers.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let z = self.scores(x)?;
        Ok(self.finish(z))
    }

    /// Predicts like `predict` after adding independent Laplace noise to every score.
    ///
    /// # Arguments
    /// * `x` - The features to predict.
    /// * `epsilon` - The privacy budget of this release.
    /// * `rng` - The noise source.
    pub fn private_predict<R: Rng + ?Sized>(
        &self,
        x: ArrayView2<f64>,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Array1<f64>> {
        let noise = LaplaceNoise::new(self.sensitivity(), epsilon)?;
        let mut z = self.scores(x)?;
        z.mapv_inplace(|v| v + noise.sample(&mut *rng));
        Ok(self.finish(z))
    }

    /// The sensitivity calibrating `private_predict`.
    pub fn sensitivity(&self) -> f64 {
        privacy::sensitivity(&self.spec, self.dim())
    }

    /// The classification or regression error of this predictor over `(x, y)`.
    pub fn error(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64> {
        let y_hat = self.predict(x)?;
        if self.is_classification() {
            metrics::classification_error(y, y_hat.view())
        } else {
            metrics::regression_error(y, y_hat.view())
        }
    }
}

#[cfg(test)]
mod tests {
    use comms::specs::machine_learning::{ObjectiveSpec, RegularizationSpec};
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn predictor(objective: ObjectiveSpec) -> LinearPredictor {
        let spec = LocalModelSpec::new(objective, RegularizationSpec::None);
        LinearPredictor::new(spec, array![1., -2.], 0.5)
    }

    #[test]
    fn classifier_predictions_are_signs() {
        let x = array![[1., 0.], [1., 1.], [2., 1.]];
        let y_hat = predictor(ObjectiveSpec::Logistic).predict(x.view()).unwrap();

        assert_eq!(y_hat, array![1., -1., 0.]);
    }

    #[test]
    fn regressor_predictions_are_raw() {
        let x = array![[1., 0.5]];
        let y_hat = predictor(ObjectiveSpec::LeastSquares).predict(x.view()).unwrap();

        assert_eq!(y_hat, array![0.]);
    }

    #[test]
    fn blob_round_trip_predicts_the_same() {
        let predictor = predictor(ObjectiveSpec::LeastSquares);
        let back = LinearPredictor::from_blob(&predictor.to_blob().unwrap()).unwrap();
        let x = array![[0.3, 0.7], [-1., 4.]];

        assert_eq!(back.predict(x.view()).unwrap(), predictor.predict(x.view()).unwrap());
        assert_eq!(back.step(), 0.5);
    }

    #[test]
    fn private_predictions_are_noised() {
        let predictor = predictor(ObjectiveSpec::LeastSquares);
        let x = array![[1., 1.], [2., 0.]];
        let mut rng = StdRng::seed_from_u64(11);

        let exact = predictor.predict(x.view()).unwrap();
        let noised = predictor.private_predict(x.view(), 0.1, &mut rng).unwrap();
        assert!(exact.iter().zip(&noised).all(|(a, b)| a != b));
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let x = array![[1., 2., 3.]];
        assert!(predictor(ObjectiveSpec::Logistic).predict(x.view()).is_err());
    }
}
