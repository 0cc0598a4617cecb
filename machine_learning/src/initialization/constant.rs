use ndarray::Array1;

use super::ParamGen;

/// Starts every coordinate at the same value, zero for most models.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstParamGen {
    value: f64,
}

impl ConstParamGen {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl ParamGen for ConstParamGen {
    fn generate(&mut self, dim: usize) -> Array1<f64> {
        Array1::from_elem(dim, self.value)
    }
}
