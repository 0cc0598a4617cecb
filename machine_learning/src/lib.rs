pub mod backend;
pub mod dataset;
pub mod error;
pub mod gradcheck;
pub mod initialization;
pub mod metrics;
pub mod model;
pub mod objective;
pub mod optimization;
pub mod training;

pub use error::{MlErr, Result};
