mod line_search;
mod proximal;
mod sparse;

use ndarray::ArrayView1;

pub use line_search::{LineSearch, MinimizeReport, StepReport, Termination};
pub use proximal::{Penalty, l1_norm, soft_threshold};
pub use sparse::{SparseUpdate, SparseUpdateProducer, shared_coordinates, top_k};

/// The largest absolute coordinate of `v`, zero for an empty vector.
pub fn inf_norm(v: ArrayView1<f64>) -> f64 {
    v.iter().fold(0., |acc, x| acc.max(x.abs()))
}
