pub mod aggregation;
mod builder;
mod coordinator;
mod ensemble;
pub mod error;
mod session;
pub mod storage;

pub use aggregation::RankWeightGenerator;
pub use builder::CoordinatorBuilder;
pub use coordinator::{FederatedFit, FederationCoordinator};
pub use ensemble::WeightedEnsemble;
pub use error::{FederationErr, Result};
pub use session::{ClientSession, Commit, ErrorReport};
