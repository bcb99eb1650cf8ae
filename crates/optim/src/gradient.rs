use crate::errors::{OptimError, Result};
use crate::objective::ObjectiveFunction;
use crate::parameters::SromParams;
use crate::types::{flatten_params, split_params};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use srombox_srom::Srom;
use srombox_target::utils::{grid_column, weighted_cdf, weighted_covariance, weighted_moments};
use srombox_target::RandomVector;

/// Gradient of the SROM [ObjectiveFunction] with respect to the flat optimization
/// vector `[samples (row-major), probabilities]`.
///
/// CDF errors are piecewise constant with respect to sample positions so they only
/// contribute to the probability components. For `MEAN` and `MAX` metrics the
/// returned vector is a subgradient.
#[derive(Clone, Debug)]
pub struct Gradient {
    objective: ObjectiveFunction,
}

impl Gradient {
    /// Constructor, same validation as [ObjectiveFunction::new]
    pub fn new(srom: &Srom, target: &dyn RandomVector, params: SromParams) -> Result<Self> {
        Ok(Gradient {
            objective: ObjectiveFunction::new(srom, target, params)?,
        })
    }

    /// Build from an already constructed objective function
    pub fn from_objective(objective: ObjectiveFunction) -> Self {
        Gradient { objective }
    }

    /// The underlying objective function
    pub fn objective(&self) -> &ObjectiveFunction {
        &self.objective
    }

    /// Gradient for (m, d) samples and (m,) probabilities, returned as a vector of
    /// length `m * (d + 1)` in the flat parameter layout
    pub fn evaluate(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
    ) -> Result<Array1<f64>> {
        let obj = &self.objective;
        if samples.dim() != (obj.size, obj.dim) || probabilities.len() != obj.size {
            return Err(OptimError::InvalidValue(format!(
                "SROM parameters should have shapes ({}, {}) and ({},)",
                obj.size, obj.dim, obj.size
            )));
        }
        let mut grad_x = Array2::zeros((obj.size, obj.dim));
        let mut grad_p = Array1::zeros(obj.size);
        if obj.weight(0) > 0. {
            self.add_moment_gradient(samples, probabilities, &mut grad_x, &mut grad_p)?;
        }
        if obj.weight(1) > 0. {
            self.add_cdf_gradient(samples, probabilities, &mut grad_p)?;
        }
        if obj.weight(2) > 0. && obj.dim > 1 {
            self.add_correlation_gradient(samples, probabilities, &mut grad_x, &mut grad_p);
        }
        Ok(flatten_params(&grad_x.view(), &grad_p.view()))
    }

    /// Gradient for a flat parameter vector
    pub fn evaluate_flat(&self, x: &[f64]) -> Result<Array1<f64>> {
        let (samples, probabilities) = split_params(x, self.objective.size, self.objective.dim)?;
        self.evaluate(&samples, &probabilities)
    }

    fn add_moment_gradient(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
        grad_x: &mut Array2<f64>,
        grad_p: &mut Array1<f64>,
    ) -> Result<()> {
        let obj = &self.objective;
        let w = obj.weight(0);
        let moments = weighted_moments(samples, probabilities, obj.params.max_moment())?;
        let sens = obj.moments.sensitivities(obj.metric, &moments);
        for ((q, i), s) in sens.indexed_iter() {
            if *s == 0. {
                continue;
            }
            let order = (q + 1) as i32;
            for j in 0..obj.size {
                let x = samples[[j, i]];
                grad_p[j] += w * s * x.powi(order);
                grad_x[[j, i]] += w * s * order as f64 * probabilities[j] * x.powi(order - 1);
            }
        }
        Ok(())
    }

    fn add_cdf_gradient(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
        grad_p: &mut Array1<f64>,
    ) -> Result<()> {
        let obj = &self.objective;
        let w = obj.weight(1);
        let x_grid = obj.x_grid.view();
        let cdfs = weighted_cdf(samples, probabilities, &x_grid)?;
        let sens = obj.cdfs.sensitivities(obj.metric, &cdfs);
        for i in 0..obj.dim {
            let grid = grid_column(&x_grid, obj.dim, i);
            for (k, g) in grid.iter().enumerate() {
                let s = sens[[k, i]];
                if s == 0. {
                    continue;
                }
                for j in 0..obj.size {
                    if samples[[j, i]] <= *g {
                        grad_p[j] += w * s;
                    }
                }
            }
        }
        Ok(())
    }

    fn add_correlation_gradient(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
        grad_x: &mut Array2<f64>,
        grad_p: &mut Array1<f64>,
    ) {
        let obj = &self.objective;
        let w = obj.weight(2);
        let (mean, cov) = weighted_covariance(samples, probabilities);
        let corr = srombox_target::utils::covariance_to_correlation(&cov);
        let sens = obj.correlations.sensitivities(obj.metric, &corr);
        for a in 0..obj.dim {
            for b in (a + 1)..obj.dim {
                let s = sens[[a, b]];
                let (saa, sbb) = (cov[[a, a]], cov[[b, b]]);
                if s == 0. || saa <= 0. || sbb <= 0. {
                    continue;
                }
                let denom = (saa * sbb).sqrt();
                let rho = corr[[a, b]];
                let (mu_a, mu_b) = (mean[a], mean[b]);
                for j in 0..obj.size {
                    let (xa, xb) = (samples[[j, a]], samples[[j, b]]);
                    let p = probabilities[j];
                    let ds_ab = xa * xb - xa * mu_b - mu_a * xb;
                    let ds_aa = xa * xa - 2. * xa * mu_a;
                    let ds_bb = xb * xb - 2. * xb * mu_b;
                    let drho_dp = ds_ab / denom - 0.5 * rho * (ds_aa / saa + ds_bb / sbb);
                    let drho_dxa = p * (xb - mu_b) / denom - rho * p * (xa - mu_a) / saa;
                    let drho_dxb = p * (xa - mu_a) / denom - rho * p * (xb - mu_b) / sbb;
                    grad_p[j] += w * s * drho_dp;
                    grad_x[[j, a]] += w * s * drho_dxa;
                    grad_x[[j, b]] += w * s * drho_dxb;
                }
            }
        }
    }
}
