use ndarray::Array1;

/// Produces the starting point of a model's parameters.
pub trait ParamGen {
    /// Generates `dim` initial parameters.
    fn generate(&mut self, dim: usize) -> Array1<f64>;
}
