use std::{
    error::Error,
    fmt::{self, Display},
};

/// Returned by `SharedParams` whenever an update doesn't match the stored dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchErr {
    pub got: usize,
    pub expected: usize,
}

impl Display for SizeMismatchErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SharedParams error: got an update of length {} for {} parameters",
            self.got, self.expected
        )
    }
}

impl Error for SizeMismatchErr {}
