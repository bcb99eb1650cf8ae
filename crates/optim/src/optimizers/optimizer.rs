use crate::types::ObjFn;
use cobyla::{RhoBeg, SuccessStatus as CobylaStatus};
use log::debug;
use ndarray::{arr1, Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use slsqp::SuccessStatus as SlsqpStatus;
use std::ops::Range;

/// Constrained nonlinear solvers available to optimize SROM parameters
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Sequential least squares programming, uses the analytic gradient
    #[default]
    Slsqp,
    /// Derivative-free constrained optimization by linear approximations
    Cobyla,
}

pub const MAX_EVAL_DEFAULT: usize = 1000;

/// Outcome of a single solver run
#[derive(Clone, Debug)]
pub(crate) struct Minimum {
    pub y_opt: f64,
    pub x_opt: Array1<f64>,
    pub converged: bool,
    pub status: String,
}

/// Facade for the slsqp and cobyla solvers. Components of the decision vector
/// within the `simplex` range are constrained to sum to one.
pub(crate) struct Optimizer<'a> {
    algo: Algorithm,
    fun: &'a (dyn ObjFn<()> + Sync),
    bounds: Vec<(f64, f64)>,
    simplex: Range<usize>,
    max_eval: usize,
    xinit: Option<Array1<f64>>,
    ftol_abs: Option<f64>,
    ftol_rel: Option<f64>,
}

impl<'a> Optimizer<'a> {
    pub fn new(
        algo: Algorithm,
        fun: &'a (dyn ObjFn<()> + Sync),
        bounds: &[(f64, f64)],
        simplex: Range<usize>,
    ) -> Self {
        Optimizer {
            algo,
            fun,
            bounds: bounds.to_vec(),
            simplex,
            max_eval: MAX_EVAL_DEFAULT,
            xinit: None,
            ftol_abs: None,
            ftol_rel: None,
        }
    }

    pub fn ftol_abs(&mut self, ftol_abs: f64) -> &mut Self {
        self.ftol_abs = Some(ftol_abs);
        self
    }

    pub fn ftol_rel(&mut self, ftol_rel: f64) -> &mut Self {
        self.ftol_rel = Some(ftol_rel);
        self
    }

    pub fn max_eval(&mut self, max_eval: usize) -> &mut Self {
        self.max_eval = max_eval;
        self
    }

    pub fn xinit(&mut self, xinit: &ArrayView1<f64>) -> &mut Self {
        self.xinit = Some(xinit.to_owned());
        self
    }

    pub fn minimize(&self) -> Minimum {
        let xinit = match &self.xinit {
            Some(x) => x.to_vec(),
            None => self.bounds.iter().map(|(lb, ub)| 0.5 * (lb + ub)).collect(),
        };
        // equality sum(p) = 1 as a pair of opposite inequalities
        let signs = [1., -1.];
        let res = match self.algo {
            Algorithm::Cobyla => {
                let cstrs: Vec<_> = signs
                    .iter()
                    .map(|&sign| {
                        let simplex = self.simplex.clone();
                        move |x: &[f64], _u: &mut ()| {
                            sign * (x[simplex.clone()].iter().sum::<f64>() - 1.)
                        }
                    })
                    .collect();
                let res = cobyla::minimize(
                    |x: &[f64], u: &mut ()| (self.fun)(x, None, u),
                    &xinit,
                    &self.bounds,
                    &cstrs,
                    (),
                    self.max_eval,
                    RhoBeg::All(0.5),
                    Some(cobyla::StopTols {
                        ftol_rel: self.ftol_rel.unwrap_or(0.0),
                        ftol_abs: self.ftol_abs.unwrap_or(0.0),
                        ..cobyla::StopTols::default()
                    }),
                );
                match res {
                    Ok((status, x_opt, y_opt)) => {
                        let converged = cobyla_converged(status);
                        Self::success(format!("{status:?}"), converged, y_opt, &x_opt)
                    }
                    Err((status, x_opt, y_opt)) => {
                        Self::failure(format!("{status:?}"), y_opt, &x_opt)
                    }
                }
            }
            Algorithm::Slsqp => {
                let cstrs: Vec<_> = signs
                    .iter()
                    .map(|&sign| {
                        let simplex = self.simplex.clone();
                        move |x: &[f64], g: Option<&mut [f64]>, _u: &mut ()| {
                            if let Some(g) = g {
                                g.iter_mut().enumerate().for_each(|(i, gi)| {
                                    *gi = if simplex.contains(&i) { sign } else { 0. }
                                });
                            }
                            sign * (x[simplex.clone()].iter().sum::<f64>() - 1.)
                        }
                    })
                    .collect();
                let res = slsqp::minimize(
                    self.fun,
                    &xinit,
                    &self.bounds,
                    &cstrs,
                    (),
                    self.max_eval,
                    Some(slsqp::StopTols {
                        ftol_rel: self.ftol_rel.unwrap_or(0.0),
                        ftol_abs: self.ftol_abs.unwrap_or(0.0),
                        ..slsqp::StopTols::default()
                    }),
                );
                match res {
                    Ok((status, x_opt, y_opt)) => {
                        let converged = slsqp_converged(status);
                        Self::success(format!("{status:?}"), converged, y_opt, &x_opt)
                    }
                    Err((status, x_opt, y_opt)) => {
                        Self::failure(format!("{status:?}"), y_opt, &x_opt)
                    }
                }
            }
        };
        debug!("... end optimization ({})", res.status);
        res
    }

    fn success(status: String, converged: bool, y_opt: f64, x_opt: &[f64]) -> Minimum {
        Minimum {
            y_opt,
            x_opt: arr1(x_opt),
            converged,
            status,
        }
    }

    fn failure(status: String, y_opt: f64, x_opt: &[f64]) -> Minimum {
        Minimum {
            y_opt: if y_opt.is_finite() { y_opt } else { f64::INFINITY },
            x_opt: arr1(x_opt),
            converged: false,
            status,
        }
    }
}

fn cobyla_converged(status: CobylaStatus) -> bool {
    !matches!(
        status,
        CobylaStatus::MaxEvalReached | CobylaStatus::MaxTimeReached
    )
}

fn slsqp_converged(status: SlsqpStatus) -> bool {
    !matches!(
        status,
        SlsqpStatus::MaxEvalReached | SlsqpStatus::MaxTimeReached
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn quadratic(x: &[f64], g: Option<&mut [f64]>, _u: &mut ()) -> f64 {
        let target = [0.2, 0.5, 0.3];
        if let Some(g) = g {
            for i in 0..3 {
                g[i] = 2. * (x[i] - target[i]);
            }
        }
        (0..3).map(|i| (x[i] - target[i]).powi(2)).sum()
    }

    fn shifted_quadratic(x: &[f64], g: Option<&mut [f64]>, _u: &mut ()) -> f64 {
        // unconstrained minimum (0.5, 0.5, 0.5) is outside the simplex
        if let Some(g) = g {
            for i in 0..3 {
                g[i] = 2. * (x[i] - 0.5);
            }
        }
        x.iter().map(|v| (v - 0.5).powi(2)).sum()
    }

    #[test]
    fn test_slsqp_simplex_constraint() {
        let bounds = vec![(0., 1.); 3];
        let res = Optimizer::new(Algorithm::Slsqp, &shifted_quadratic, &bounds, 0..3)
            .xinit(&array![1. / 3., 1. / 3., 1. / 3.].view())
            .ftol_rel(1e-10)
            .minimize();
        assert_abs_diff_eq!(res.x_opt.sum(), 1., epsilon = 1e-6);
        assert_abs_diff_eq!(res.x_opt, array![1. / 3., 1. / 3., 1. / 3.], epsilon = 1e-4);
    }

    #[test]
    fn test_slsqp_feasible_minimum() {
        let bounds = vec![(0., 1.); 3];
        let res = Optimizer::new(Algorithm::Slsqp, &quadratic, &bounds, 0..3)
            .xinit(&array![0.6, 0.2, 0.2].view())
            .ftol_rel(1e-10)
            .minimize();
        assert!(res.converged);
        assert_abs_diff_eq!(res.x_opt, array![0.2, 0.5, 0.3], epsilon = 1e-4);
    }

    #[test]
    fn test_cobyla_simplex_constraint() {
        let bounds = vec![(0., 1.); 3];
        let res = Optimizer::new(Algorithm::Cobyla, &shifted_quadratic, &bounds, 0..3)
            .xinit(&array![0.5, 0.3, 0.2].view())
            .max_eval(2000)
            .minimize();
        assert_abs_diff_eq!(res.x_opt.sum(), 1., epsilon = 1e-3);
        assert_abs_diff_eq!(res.x_opt, array![1. / 3., 1. / 3., 1. / 3.], epsilon = 1e-2);
    }

    #[test]
    fn test_max_eval_reached_not_converged() {
        let bounds = vec![(0., 1.); 3];
        for algo in [Algorithm::Slsqp, Algorithm::Cobyla] {
            let res = Optimizer::new(algo, &quadratic, &bounds, 0..3)
                .xinit(&array![0.6, 0.2, 0.2].view())
                .max_eval(1)
                .minimize();
            assert!(!res.converged);
        }
    }
}
