mod local;
mod predictor;
pub mod privacy;
pub mod selection;

pub use local::{FitSummary, GradientStep, LocalModel};
pub use predictor::{LinearPredictor, sign};
