use comms::ModelBlob;
use machine_learning::model::{LinearPredictor, sign};
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::{FederationErr, RankWeightGenerator, Result};

/// A global model made of committed client models and one weight per model.
///
/// Members with a zero weight are never decoded.
#[derive(Debug, Clone)]
pub struct WeightedEnsemble {
    members: Vec<ModelBlob>,
    weights: Array1<f64>,
}

impl WeightedEnsemble {
    /// Creates a new `WeightedEnsemble`.
    ///
    /// # Arguments
    /// * `members` - The committed models.
    /// * `weights` - One weight per member.
    pub fn new(members: Vec<ModelBlob>, weights: Array1<f64>) -> Result<Self> {
        if members.len() != weights.len() {
            return Err(FederationErr::SizeMismatch {
                what: "ensemble weights",
                got: weights.len(),
                expected: members.len(),
            });
        }

        if members.is_empty() {
            return Err(FederationErr::NoModels);
        }

        Ok(Self { members, weights })
    }

    /// Builds an ensemble weighted by `RankWeightGenerator`.
    ///
    /// # Arguments
    /// * `members` - The committed models.
    /// * `errors` - `errors[(i, j)]` is the error client `i` measured on member `j`.
    /// * `sizes` - The dataset size of every client.
    pub fn from_rank_weights(
        members: Vec<ModelBlob>,
        errors: ArrayView2<f64>,
        sizes: ArrayView1<f64>,
    ) -> Result<Self> {
        if errors.ncols() != members.len() {
            return Err(FederationErr::SizeMismatch {
                what: "error matrix columns",
                got: errors.ncols(),
                expected: members.len(),
            });
        }

        let weights = RankWeightGenerator::new().generate(errors, sizes)?;
        Self::new(members, weights)
    }

    pub fn members(&self) -> &[ModelBlob] {
        &self.members
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Predicts `Σ weight_i * predict_i(x)`, thresholded with `sign` when the members classify.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let mut total = Array1::<f64>::zeros(x.nrows());
        let mut classification = false;

        for (blob, &weight) in self.members.iter().zip(&self.weights) {
            if weight == 0. {
                continue;
            }

            let predictor = LinearPredictor::from_blob(blob)?;
            classification |= predictor.is_classification();
            total.scaled_add(weight, &predictor.predict(x)?);
        }

        if classification {
            total.mapv_inplace(sign);
        }

        Ok(total)
    }
}
