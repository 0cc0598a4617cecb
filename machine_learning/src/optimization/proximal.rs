use ndarray::{Array1, ArrayView1};

use super::inf_norm;

/// Shrinks every coordinate of `v` towards zero by `threshold`, zeroing the ones that cross it.
pub fn soft_threshold(v: &mut Array1<f64>, threshold: f64) {
    v.mapv_inplace(|x| x.signum() * (x.abs() - threshold).max(0.));
}

pub fn l1_norm(v: ArrayView1<f64>) -> f64 {
    v.iter().map(|x| x.abs()).sum()
}

/// The non smooth part of a composite objective `f(w) + penalty(w)`.
#[derive(Debug, Clone, Copy)]
pub enum Penalty {
    None,
    L1(f64),
}

impl Penalty {
    pub fn value(self, w: ArrayView1<f64>) -> f64 {
        match self {
            Penalty::None => 0.,
            Penalty::L1(lambda) => lambda * l1_norm(w),
        }
    }

    /// Applies the proximal operator of `step * penalty` to `w`.
    pub fn prox(self, w: &mut Array1<f64>, step: f64) {
        if let Penalty::L1(lambda) = self {
            soft_threshold(w, lambda * step);
        }
    }

    /// The first order optimality measure, zero exactly at a minimizer.
    pub fn opt_cond(self, w: ArrayView1<f64>, g: ArrayView1<f64>) -> f64 {
        match self {
            Penalty::None => inf_norm(g),
            Penalty::L1(lambda) => {
                let mut p = &w - &g;
                soft_threshold(&mut p, lambda);
                inf_norm((&w - &p).view())
            }
        }
    }
}
