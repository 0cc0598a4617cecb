use ndarray::{Array1, ArrayView1};

use super::SizeMismatchErr;

/// The shared parameter vector of a federated fit.
///
/// Only the coordinator owns it, updates are applied one at a time in arrival order.
#[derive(Debug, Clone)]
pub struct SharedParams {
    w: Array1<f64>,
    updates: usize,
}

impl SharedParams {
    /// Creates a new zeroed `SharedParams`.
    ///
    /// # Arguments
    /// * `dim` - The amount of parameters.
    pub fn new(dim: usize) -> Self {
        Self {
            w: Array1::zeros(dim),
            updates: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    pub fn params(&self) -> ArrayView1<'_, f64> {
        self.w.view()
    }

    /// The amount of updates accumulated since creation.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Adds `delta` to the stored parameters.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `delta` doesn't have one entry per parameter.
    pub fn accumulate(&mut self, delta: ArrayView1<f64>) -> Result<(), SizeMismatchErr> {
        if delta.len() != self.len() {
            return Err(SizeMismatchErr {
                got: delta.len(),
                expected: self.len(),
            });
        }

        self.w += &delta;
        self.updates += 1;
        Ok(())
    }
}
