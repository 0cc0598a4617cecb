use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidParameter {
        what: &'static str,
        value: f64,
    },
    InvalidInput(&'static str),
    LineSearchStalled {
        evals: usize,
        step: f64,
    },
    GradientMismatch {
        index: usize,
        analytic: f64,
        numeric: f64,
    },
    NotFitted,
    Codec(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidParameter { what, value } => {
                write!(f, "The value {value} is not valid for {what}")
            }
            MlErr::InvalidInput(reason) => write!(f, "Invalid input: {reason}"),
            MlErr::LineSearchStalled { evals, step } => write!(
                f,
                "The line search failed to find a sufficient decrease after {evals} evaluations (step {step:e})"
            ),
            MlErr::GradientMismatch {
                index,
                analytic,
                numeric,
            } => write!(
                f,
                "The analytic gradient at coordinate {index} is {analytic} but the numeric one is {numeric}"
            ),
            MlErr::NotFitted => write!(f, "The model has not been fitted yet"),
            MlErr::Codec(e) => write!(f, "Failed to encode or decode a model: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Codec(value)
    }
}
