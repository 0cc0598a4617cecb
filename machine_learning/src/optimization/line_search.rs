use std::num::NonZeroUsize;

use log::{debug, trace};
use ndarray::{Array1, ArrayView1, ArrayView2};

use super::proximal::Penalty;
use crate::{MlErr, Result, objective::LossFn};

const MAX_BACKTRACKS: usize = 64;
const MIN_WARM_STEP: f64 = 1e-10;
const MAX_WARM_STEP: f64 = 1e10;

/// Why a minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    BudgetExhausted,
}

/// The outcome of `LineSearch::minimize`.
#[derive(Debug, Clone)]
pub struct MinimizeReport {
    pub w: Array1<f64>,
    /// The objective at `w`, penalty included.
    pub loss: f64,
    /// The initial step to use on the next call.
    pub step: f64,
    pub opt_cond: f64,
    pub evals: usize,
    pub termination: Termination,
}

/// The outcome of a single accepted gradient step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub w: Array1<f64>,
    /// The move from the starting point to `w`, `-accepted_step * g` without a penalty.
    pub delta: Array1<f64>,
    pub loss: f64,
    pub grad: Array1<f64>,
    pub accepted_step: f64,
    pub next_step: f64,
    pub evals: usize,
}

struct Trial {
    w: Array1<f64>,
    loss: f64,
    grad: Array1<f64>,
    step: f64,
}

enum Search {
    Accepted(Trial),
    OutOfBudget,
}

/// Gradient descent with an Armijo backtracking line search.
///
/// Rejected steps are shrunk by minimizing the quadratic interpolating `f(w)`, the directional
/// derivative and the rejected trial value. Accepted steps seed the next initial step with the
/// Barzilai-Borwein rule.
#[derive(Debug, Clone, Copy)]
pub struct LineSearch {
    max_evals: NonZeroUsize,
    opt_tol: f64,
    gamma: f64,
}

/// Falls back to a unit step whenever the proposal is unusable.
fn warm_step(step: f64) -> f64 {
    if (MIN_WARM_STEP..=MAX_WARM_STEP).contains(&step) {
        step
    } else {
        1.
    }
}

fn barzilai_borwein(step: f64, grad: ArrayView1<f64>, grad_new: ArrayView1<f64>) -> f64 {
    let y = &grad_new - &grad;
    warm_step(-step * y.dot(&grad) / y.dot(&y))
}

fn check_shapes(w: usize, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(MlErr::SizeMismatch {
            what: "targets",
            got: y.len(),
            expected: x.nrows(),
        });
    }

    if w != x.ncols() {
        return Err(MlErr::SizeMismatch {
            what: "parameters",
            got: w,
            expected: x.ncols(),
        });
    }

    Ok(())
}

impl LineSearch {
    /// Creates a new `LineSearch` minimizer.
    ///
    /// # Arguments
    /// * `max_evals` - The maximum amount of objective evaluations per `minimize` call.
    /// * `opt_tol` - Convergence threshold on the infinity norm of the optimality measure.
    /// * `gamma` - The sufficient decrease constant of the Armijo condition.
    pub fn new(max_evals: NonZeroUsize, opt_tol: f64, gamma: f64) -> Self {
        Self {
            max_evals,
            opt_tol,
            gamma,
        }
    }

    pub fn with_max_evals(self, max_evals: NonZeroUsize) -> Self {
        Self { max_evals, ..self }
    }

    pub fn max_evals(&self) -> usize {
        self.max_evals.get()
    }

    pub fn opt_tol(&self) -> f64 {
        self.opt_tol
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Minimizes a smooth objective starting from `w`.
    ///
    /// # Arguments
    /// * `objective` - The objective to minimize.
    /// * `w` - The starting point.
    /// * `step` - The initial step, usually the one returned by the previous call.
    /// * `x` - The feature matrix.
    /// * `y` - The targets.
    ///
    /// # Returns
    /// The final point with its loss, the step to carry forward and how many evaluations were
    /// spent, or an error if the shapes don't match or the line search stalls.
    pub fn minimize<L: LossFn>(
        &self,
        objective: &L,
        w: Array1<f64>,
        step: f64,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<MinimizeReport> {
        self.run(objective, Penalty::None, w, step, x, y)
    }

    /// Minimizes `objective(w) + lambda * ||w||₁` with proximal gradient steps.
    ///
    /// Every trial point is soft thresholded and the sufficient decrease test is applied to the
    /// composite objective. Convergence is measured with `||w - prox(w - g)||∞`.
    pub fn minimize_l1<L: LossFn>(
        &self,
        objective: &L,
        lambda: f64,
        w: Array1<f64>,
        step: f64,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<MinimizeReport> {
        if !(lambda.is_finite() && lambda >= 0.) {
            return Err(MlErr::InvalidParameter {
                what: "l1 lambda",
                value: lambda,
            });
        }

        self.run(objective, Penalty::L1(lambda), w, step, x, y)
    }

    /// Takes exactly one accepted gradient step from `w`, ignoring the evaluation budget.
    ///
    /// With an L1 penalty the step is proximal and accepted on the composite objective, the same
    /// iteration `minimize_l1` takes.
    ///
    /// # Returns
    /// The new point, its loss and gradient, or `LineSearchStalled` if no step is accepted
    /// within the backtracking bound.
    pub fn step<L: LossFn>(
        &self,
        objective: &L,
        penalty: Penalty,
        w: ArrayView1<f64>,
        step: f64,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<StepReport> {
        check_shapes(w.len(), x, y)?;

        let (loss, grad) = objective.loss_grad(w, x, y);
        let mut evals = 1;

        let search = self.search(
            objective,
            penalty,
            w,
            loss,
            grad.view(),
            warm_step(step),
            x,
            y,
            &mut evals,
            None,
        )?;

        let Search::Accepted(trial) = search else {
            return Err(MlErr::LineSearchStalled { evals, step });
        };

        let delta = match penalty {
            Penalty::None => &grad * -trial.step,
            Penalty::L1(_) => &trial.w - &w,
        };

        Ok(StepReport {
            delta,
            next_step: barzilai_borwein(trial.step, grad.view(), trial.grad.view()),
            accepted_step: trial.step,
            w: trial.w,
            loss: trial.loss,
            grad: trial.grad,
            evals,
        })
    }

    fn run<L: LossFn>(
        &self,
        objective: &L,
        penalty: Penalty,
        mut w: Array1<f64>,
        step: f64,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<MinimizeReport> {
        check_shapes(w.len(), x, y)?;

        let max_evals = self.max_evals.get();
        let (mut loss, mut grad) = objective.loss_grad(w.view(), x, y);
        let mut evals = 1;
        let mut step = warm_step(step);
        let mut opt_cond = penalty.opt_cond(w.view(), grad.view());

        let termination = loop {
            if opt_cond < self.opt_tol {
                break Termination::Converged;
            }

            if evals >= max_evals {
                break Termination::BudgetExhausted;
            }

            let search = self.search(
                objective,
                penalty,
                w.view(),
                loss,
                grad.view(),
                step,
                x,
                y,
                &mut evals,
                Some(max_evals),
            )?;

            let Search::Accepted(trial) = search else {
                break Termination::BudgetExhausted;
            };

            step = barzilai_borwein(trial.step, grad.view(), trial.grad.view());
            w = trial.w;
            loss = trial.loss;
            grad = trial.grad;
            opt_cond = penalty.opt_cond(w.view(), grad.view());
        };

        let loss = loss + penalty.value(w.view());
        debug!(
            "minimizer stopped ({termination:?}) after {evals} evaluations, loss {loss:e}, opt cond {opt_cond:e}"
        );

        Ok(MinimizeReport {
            w,
            loss,
            step,
            opt_cond,
            evals,
            termination,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn search<L: LossFn>(
        &self,
        objective: &L,
        penalty: Penalty,
        w: ArrayView1<f64>,
        loss: f64,
        grad: ArrayView1<f64>,
        mut step: f64,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        evals: &mut usize,
        limit: Option<usize>,
    ) -> Result<Search> {
        let gg = grad.dot(&grad);
        let total = loss + penalty.value(w);

        for backtracks in 0..=MAX_BACKTRACKS {
            let mut w_new = w.to_owned();
            w_new.scaled_add(-step, &grad);
            penalty.prox(&mut w_new, step);

            let (loss_new, grad_new) = objective.loss_grad(w_new.view(), x, y);
            *evals += 1;
            let total_new = loss_new + penalty.value(w_new.view());

            let decrease = match penalty {
                Penalty::None => step * gg,
                Penalty::L1(_) => {
                    let d = &w_new - &w;
                    d.dot(&d) / step
                }
            };

            if total_new <= total - self.gamma * decrease {
                return Ok(Search::Accepted(Trial {
                    w: w_new,
                    loss: loss_new,
                    grad: grad_new,
                    step,
                }));
            }

            if limit.is_some_and(|limit| *evals >= limit) {
                return Ok(Search::OutOfBudget);
            }

            trace!("backtrack {backtracks}: step {step:e} gave {total_new:e} from {total:e}");

            if !total_new.is_finite() {
                step /= 2.;
                continue;
            }

            let next = step * step * gg / (2. * (total_new - total + step * gg));
            step = match penalty {
                _ if next > 0. && next < step => next,
                // The prox may leave the interpolation without a usable minimum.
                Penalty::L1(_) => step / 2.,
                Penalty::None => {
                    return Err(MlErr::LineSearchStalled {
                        evals: *evals,
                        step,
                    });
                }
            };
        }

        Err(MlErr::LineSearchStalled {
            evals: *evals,
            step,
        })
    }
}
