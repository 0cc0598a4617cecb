mod least_squares;
mod logistic;
mod loss_fn;
mod ridge;

use comms::specs::machine_learning::ObjectiveSpec;
use ndarray::{Array1, ArrayView1, ArrayView2};

pub use least_squares::LeastSquares;
pub use logistic::Logistic;
pub use loss_fn::LossFn;
pub use ridge::Ridge;

/// The smooth objectives a local model can be fitted with.
#[derive(Debug, Clone, Copy)]
pub enum Objective {
    LeastSquares(LeastSquares),
    Logistic(Logistic),
}

impl Objective {
    /// Whether predictions of this objective are labels in {-1, 0, +1}.
    pub fn is_classification(&self) -> bool {
        matches!(self, Objective::Logistic(_))
    }
}

impl From<ObjectiveSpec> for Objective {
    fn from(spec: ObjectiveSpec) -> Self {
        match spec {
            ObjectiveSpec::LeastSquares => Objective::LeastSquares(LeastSquares),
            ObjectiveSpec::Logistic => Objective::Logistic(Logistic),
        }
    }
}

impl LossFn for Objective {
    fn loss_grad(
        &self,
        w: ArrayView1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> (f64, Array1<f64>) {
        match self {
            Objective::LeastSquares(l) => l.loss_grad(w, x, y),
            Objective::Logistic(l) => l.loss_grad(w, x, y),
        }
    }
}
