use std::{
    error::Error,
    fmt::{self, Display},
};

use machine_learning::MlErr;

use crate::storage::SizeMismatchErr;

/// The result type used in the entire federation module.
pub type Result<T> = std::result::Result<T, FederationErr>;

/// The federation module's error type.
#[derive(Debug)]
pub enum FederationErr {
    DimensionMismatch {
        got: usize,
        expected: usize,
    },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    IllConditioned {
        models: usize,
    },
    NoModels,
    NoData,
    NotFitted(&'static str),
    InvalidInput(&'static str),
    Ml(MlErr),
}

impl Display for FederationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FederationErr::DimensionMismatch { got, expected } => write!(
                f,
                "Can't register a model with {got} parameters, the registered ones have {expected}"
            ),
            FederationErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            FederationErr::IllConditioned { models } => write!(
                f,
                "The predictions of the {models} models are too collinear to solve for combination weights"
            ),
            FederationErr::NoModels => write!(f, "No local model has been registered"),
            FederationErr::NoData => write!(f, "The client session holds no data"),
            FederationErr::NotFitted(what) => write!(f, "The {what} has not been fitted yet"),
            FederationErr::InvalidInput(reason) => write!(f, "Invalid input: {reason}"),
            FederationErr::Ml(e) => write!(f, "{e}"),
        }
    }
}

impl Error for FederationErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FederationErr::Ml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for FederationErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<SizeMismatchErr> for FederationErr {
    fn from(SizeMismatchErr { got, expected }: SizeMismatchErr) -> Self {
        Self::SizeMismatch {
            what: "shared parameter update",
            got,
            expected,
        }
    }
}
