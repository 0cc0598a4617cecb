use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{MlErr, Result};

/// A client's share of the data: a feature matrix and its targets, one row per sample.
///
/// The first column of `x` is conventionally the bias column (all ones), models treat it like any
/// other coordinate.
#[derive(Debug, Clone)]
pub struct Partition {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl Partition {
    /// Creates a new `Partition`.
    ///
    /// # Arguments
    /// * `x` - The `n x d` feature matrix.
    /// * `y` - The `n` targets.
    ///
    /// # Returns
    /// An error if the amount of rows doesn't match the amount of targets or if there are no
    /// features.
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(MlErr::SizeMismatch {
                what: "partition targets",
                got: y.len(),
                expected: x.nrows(),
            });
        }

        if x.ncols() == 0 {
            return Err(MlErr::InvalidInput("a partition needs at least one feature"));
        }

        Ok(Self { x, y })
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// The amount of samples in this partition.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// The amount of features (parameters of a linear model) of this partition.
    pub fn dim(&self) -> usize {
        self.x.ncols()
    }

    /// Splits the rows of this partition into `parts` contiguous partitions whose sizes differ
    /// by at most one row.
    ///
    /// # Arguments
    /// * `parts` - The amount of partitions to create.
    ///
    /// # Returns
    /// An error if `parts` is zero or larger than the amount of samples.
    pub fn split(&self, parts: usize) -> Result<Vec<Partition>> {
        let n = self.len();
        if parts == 0 || parts > n {
            return Err(MlErr::InvalidInput(
                "the amount of parts must be between one and the amount of samples",
            ));
        }

        let partitions = (0..parts)
            .map(|i| {
                let (start, end) = (i * n / parts, (i + 1) * n / parts);
                Self {
                    x: self.x.slice(s![start..end, ..]).to_owned(),
                    y: self.y.slice(s![start..end]).to_owned(),
                }
            })
            .collect();

        Ok(partitions)
    }

    /// Stacks partitions back into one, in order.
    pub fn concat(parts: &[Partition]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(MlErr::InvalidInput("can't concatenate zero partitions"));
        };

        if let Some(other) = parts.iter().find(|p| p.dim() != first.dim()) {
            return Err(MlErr::SizeMismatch {
                what: "partition features",
                got: other.dim(),
                expected: first.dim(),
            });
        }

        let xs: Vec<_> = parts.iter().map(|p| p.x.view()).collect();
        let ys: Vec<_> = parts.iter().map(|p| p.y.view()).collect();

        let shape_err = |_| MlErr::InvalidInput("row shapes differ");
        let x = ndarray::concatenate(Axis(0), &xs).map_err(shape_err)?;
        let y = ndarray::concatenate(Axis(0), &ys).map_err(shape_err)?;
        Ok(Self { x, y })
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.x, self.y)
    }
}

/// A dataset as handed over by a loader: training data plus a held out validation set.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub x_valid: Array2<f64>,
    pub y_valid: Array1<f64>,
}

impl DatasetSplit {
    /// The training half as a `Partition`.
    pub fn train(&self) -> Result<Partition> {
        Partition::new(self.x.clone(), self.y.clone())
    }

    /// The validation half as a `Partition`.
    pub fn validation(&self) -> Result<Partition> {
        Partition::new(self.x_valid.clone(), self.y_valid.clone())
    }
}

/// Anything that can produce named datasets, this crate never reads files on its own.
pub trait DatasetSource {
    /// Loads the dataset called `name`.
    fn load(&self, name: &str) -> Result<DatasetSplit>;
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn partition(n: usize) -> Partition {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { 1. } else { i as f64 });
        let y = Array1::from_shape_fn(n, |i| i as f64);
        Partition::new(x, y).unwrap()
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let x = Array2::zeros((3, 2));
        let y = array![1., 2.];

        assert!(matches!(
            Partition::new(x, y),
            Err(MlErr::SizeMismatch {
                got: 2,
                expected: 3,
                ..
            })
        ));
    }

    #[test]
    fn split_is_contiguous_and_balanced() {
        let parts = partition(10).split(4).unwrap();

        let sizes: Vec<_> = parts.iter().map(Partition::len).collect();
        assert_eq!(sizes, [2, 3, 2, 3]);
        assert_eq!(parts[1].y(), array![2., 3., 4.]);
        assert_eq!(parts[3].x()[[0, 1]], 7.);
    }

    #[test]
    fn split_then_concat_gives_back_the_rows() {
        let whole = partition(7);
        let back = Partition::concat(&whole.split(3).unwrap()).unwrap();

        assert_eq!(back.x(), whole.x());
        assert_eq!(back.y(), whole.y());
    }

    #[test]
    fn split_rejects_too_many_parts() {
        assert!(partition(3).split(4).is_err());
        assert!(partition(3).split(0).is_err());
    }
}
