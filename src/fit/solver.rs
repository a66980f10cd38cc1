//! Damped nonlinear least squares (Levenberg–Marquardt).
//!
//! Shared by the cylinder, cosine and sigmoid fits. A problem exposes its
//! residual vector; the Jacobian defaults to central differences. The
//! damping factor adapts to the ratio between actual and predicted cost
//! reduction. Running out of iterations or damping is reported as
//! [`MorphError::FitDidNotConverge`] carrying the last accepted iterate.

use crate::error::{MorphError, Result};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// A residual model `r(p)` minimised in the least-squares sense.
pub trait LeastSquaresProblem {
    /// Residuals evaluated at `params`.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Jacobian `∂r/∂p` at `params`.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        central_difference_jacobian(|p| self.residuals(p), params)
    }
}

/// Stopping criteria of the solver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Maximum number of accepted or attempted outer iterations.
    pub max_iterations: usize,
    /// Relative cost reduction below which the fit is considered converged.
    pub ftol: f64,
    /// Relative step length below which the fit is considered converged.
    pub xtol: f64,
    /// Infinity norm of the gradient below which the fit is converged.
    pub gtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-12,
            xtol: 1e-10,
            gtol: 1e-14,
        }
    }
}

/// Converged solution.
#[derive(Clone, Debug)]
pub struct Solution {
    pub params: DVector<f64>,
    /// Half the squared residual norm at `params`.
    pub cost: f64,
    pub iterations: usize,
}

impl Solution {
    /// Root-mean-square residual.
    pub fn rms(&self, n_residuals: usize) -> f64 {
        if n_residuals == 0 {
            0.0
        } else {
            (2.0 * self.cost / n_residuals as f64).sqrt()
        }
    }
}

/// Adaptive damping schedule for the Levenberg–Marquardt step.
struct AdaptiveDamping {
    lambda: f64,
    factor: f64,
    min_lambda: f64,
    max_lambda: f64,
}

impl AdaptiveDamping {
    fn new() -> Self {
        Self {
            lambda: 1e-3,
            factor: 10.0,
            min_lambda: 1e-12,
            max_lambda: 1e12,
        }
    }

    /// `rho` is the ratio of actual to predicted cost reduction.
    fn update(&mut self, rho: f64) {
        if rho > 0.75 {
            self.lambda = (self.lambda / self.factor).max(self.min_lambda);
        } else if rho > 0.25 {
            self.lambda = (self.lambda / self.factor.sqrt()).max(self.min_lambda);
        } else if rho < 0.0 {
            self.lambda = (self.lambda * self.factor).min(self.max_lambda);
        }
    }

    fn reject_step(&mut self) {
        self.lambda = (self.lambda * self.factor).min(self.max_lambda);
    }

    fn is_stuck(&self) -> bool {
        self.lambda >= self.max_lambda * 0.99
    }
}

/// Levenberg–Marquardt driver.
#[derive(Clone, Debug, Default)]
pub struct LevenbergMarquardt {
    pub options: SolverOptions,
}

impl LevenbergMarquardt {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// Minimises `problem` starting from `initial`.
    pub fn minimize<P: LeastSquaresProblem + ?Sized>(
        &self,
        problem: &P,
        initial: DVector<f64>,
    ) -> Result<Solution> {
        let opts = &self.options;
        let mut params = initial;
        let mut residuals = problem.residuals(&params);
        if residuals.is_empty() {
            return Err(MorphError::TooShort {
                found: 0,
                minimum: params.len(),
            });
        }
        let mut cost = 0.5 * residuals.norm_squared();
        if !cost.is_finite() {
            return Err(MorphError::MalformedInput(
                "initial residuals are not finite".into(),
            ));
        }

        let mut damping = AdaptiveDamping::new();
        let n = params.len();
        for iteration in 1..=opts.max_iterations {
            let jac = problem.jacobian(&params);
            let grad = jac.tr_mul(&residuals);
            if grad.amax() <= opts.gtol || cost == 0.0 {
                return Ok(self.finish(params, cost, iteration));
            }
            let hess = jac.tr_mul(&jac);
            let descent = -grad.clone();

            loop {
                let mut lhs = hess.clone();
                for i in 0..n {
                    lhs[(i, i)] += damping.lambda * hess[(i, i)].max(1e-12);
                }
                let Some(chol) = lhs.cholesky() else {
                    damping.reject_step();
                    if damping.is_stuck() {
                        return Err(not_converged(iteration, &params));
                    }
                    continue;
                };
                let step = chol.solve(&descent);
                let candidate = &params + &step;
                let cand_res = problem.residuals(&candidate);
                let cand_cost = 0.5 * cand_res.norm_squared();
                let predicted = -(grad.dot(&step) + 0.5 * step.dot(&(&hess * &step)));

                if cand_cost.is_finite() && cand_cost < cost {
                    let reduction = cost - cand_cost;
                    let rho = if predicted > 0.0 {
                        reduction / predicted
                    } else {
                        0.0
                    };
                    damping.update(rho);
                    let step_small =
                        step.norm() <= opts.xtol * (opts.xtol + params.norm());
                    let cost_flat = reduction <= opts.ftol * cost;
                    params = candidate;
                    residuals = cand_res;
                    cost = cand_cost;
                    if step_small || cost_flat {
                        return Ok(self.finish(params, cost, iteration));
                    }
                    break;
                }

                if step.norm() <= opts.xtol * (opts.xtol + params.norm()) {
                    // No descent left at machine resolution.
                    return Ok(self.finish(params, cost, iteration));
                }
                damping.reject_step();
                if damping.is_stuck() {
                    return Err(not_converged(iteration, &params));
                }
            }
        }
        Err(not_converged(opts.max_iterations, &params))
    }

    fn finish(&self, params: DVector<f64>, cost: f64, iterations: usize) -> Solution {
        debug!("LM converged: iterations={iterations} cost={cost:.3e}");
        Solution {
            params,
            cost,
            iterations,
        }
    }
}

fn not_converged(iterations: usize, params: &DVector<f64>) -> MorphError {
    MorphError::FitDidNotConverge {
        iterations,
        last: params.iter().copied().collect(),
    }
}

/// Central-difference Jacobian of `f` at `params`.
pub fn central_difference_jacobian(
    f: impl Fn(&DVector<f64>) -> DVector<f64>,
    params: &DVector<f64>,
) -> DMatrix<f64> {
    let base = f(params);
    let mut jac = DMatrix::<f64>::zeros(base.len(), params.len());
    let mut shifted = params.clone();
    for j in 0..params.len() {
        let h = 6e-6 * params[j].abs().max(1.0);
        shifted[j] = params[j] + h;
        let plus = f(&shifted);
        shifted[j] = params[j] - h;
        let minus = f(&shifted);
        shifted[j] = params[j];
        let col = (plus - minus) / (2.0 * h);
        jac.set_column(j, &col);
    }
    jac
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exponential {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Exponential {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(&self.y)
                    .map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            )
        }
    }

    #[test]
    fn fits_exponential_decay() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|&x| 2.5 * (-0.7 * x).exp()).collect();
        let problem = Exponential { x, y };
        let sol = LevenbergMarquardt::default()
            .minimize(&problem, DVector::from_vec(vec![1.0, 0.0]))
            .unwrap();
        assert!((sol.params[0] - 2.5).abs() < 1e-6, "{:?}", sol.params);
        assert!((sol.params[1] + 0.7).abs() < 1e-6, "{:?}", sol.params);
        assert!(sol.rms(40) < 1e-6);
    }

    #[test]
    fn reports_last_iterate_when_out_of_iterations() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|&x| 2.5 * (-0.7 * x).exp()).collect();
        let problem = Exponential { x, y };
        let solver = LevenbergMarquardt::new(SolverOptions {
            max_iterations: 1,
            ..Default::default()
        });
        match solver.minimize(&problem, DVector::from_vec(vec![1.0, 0.0])) {
            Err(MorphError::FitDidNotConverge { iterations, last }) => {
                assert_eq!(iterations, 1);
                assert_eq!(last.len(), 2);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }
}
