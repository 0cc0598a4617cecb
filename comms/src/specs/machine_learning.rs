use serde::{Deserialize, Serialize};

/// The specification for the smooth part of a model's objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveSpec {
    /// `0.5 * ||Xw - y||²`, real valued labels.
    LeastSquares,
    /// `Σ log(1 + exp(-y ⊙ Xw))`, labels in {-1, +1}.
    Logistic,
}

impl ObjectiveSpec {
    /// Whether predictions of this objective are thresholded into labels.
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Logistic)
    }
}

/// The specification for the regularization term of a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularizationSpec {
    None,
    L2 { lambda: f64 },
    L1 { lambda: f64 },
    L0 { lambda: f64 },
}

impl RegularizationSpec {
    /// Returns the regularization strength, zero for `None`.
    pub fn lambda(&self) -> f64 {
        match *self {
            Self::None => 0.,
            Self::L2 { lambda } | Self::L1 { lambda } | Self::L0 { lambda } => lambda,
        }
    }
}

/// The specification for the line search minimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimizerSpec {
    pub max_evals: usize,
    pub opt_tol: f64,
    pub gamma: f64,
}

impl Default for MinimizerSpec {
    fn default() -> Self {
        Self {
            max_evals: 100,
            opt_tol: 1e-2,
            gamma: 1e-4,
        }
    }
}

/// The specification for the initial values of a model's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamInitSpec {
    Const { value: f64 },
    Normal { mean: f64, std_dev: f64 },
}

impl Default for ParamInitSpec {
    fn default() -> Self {
        Self::Const { value: 0. }
    }
}

/// The specification for a `LocalModel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModelSpec {
    pub objective: ObjectiveSpec,
    pub regularization: RegularizationSpec,
    #[serde(default)]
    pub minimizer: MinimizerSpec,
    #[serde(default)]
    pub init: ParamInitSpec,
    /// Overrides the heuristic sensitivity used for private predictions.
    #[serde(default)]
    pub sensitivity: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LocalModelSpec {
    /// Creates a spec with the default minimizer, zero initialization and no seed.
    ///
    /// # Arguments
    /// * `objective` - The smooth part of the objective.
    /// * `regularization` - The regularization term.
    pub fn new(objective: ObjectiveSpec, regularization: RegularizationSpec) -> Self {
        Self {
            objective,
            regularization,
            minimizer: MinimizerSpec::default(),
            init: ParamInitSpec::default(),
            sensitivity: None,
            seed: None,
        }
    }

    /// Replaces the evaluation budget of the minimizer.
    pub fn with_max_evals(mut self, max_evals: usize) -> Self {
        self.minimizer.max_evals = max_evals;
        self
    }
}
