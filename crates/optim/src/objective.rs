use crate::errors::{OptimError, Result};
use crate::parameters::{ErrorMetric, SromParams, SromValidParams};
use crate::types::split_params;
use linfa::ParamGuard;
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use srombox_srom::{postprocess::generate_cdf_grids, Srom};
use srombox_target::utils::{
    covariance_to_correlation, weighted_cdf, weighted_covariance, weighted_moments,
};
use srombox_target::RandomVector;

/// Target values of a class of statistics (moments, CDF values or correlations)
/// with their scaling factors. A zero scale excludes the statistic from the error.
#[derive(Clone, Debug)]
pub(crate) struct StatTarget {
    values: Array2<f64>,
    scales: Array2<f64>,
    n_active: usize,
}

impl StatTarget {
    fn new(values: Array2<f64>, floor: f64, active: impl Fn((usize, usize), f64) -> bool) -> Self {
        let scales = Array2::from_shape_fn(values.dim(), |idx| {
            let t = values[idx];
            if !active(idx, t) {
                0.
            } else if t.abs() > floor {
                t.abs()
            } else {
                1.
            }
        });
        let n_active = scales.iter().filter(|s| **s > 0.).count();
        StatTarget {
            values,
            scales,
            n_active,
        }
    }

    /// Normalized residuals `(s - t) / scale`, zero for excluded statistics
    pub(crate) fn residuals(&self, srom: &Array2<f64>) -> Array2<f64> {
        let mut res = srom - &self.values;
        Zip::from(&mut res).and(&self.scales).for_each(|r, s| {
            *r = if *s > 0. { *r / s } else { 0. };
        });
        res
    }

    /// Error of the class given SROM statistics
    pub(crate) fn error(&self, metric: ErrorMetric, srom: &Array2<f64>) -> f64 {
        if self.n_active == 0 {
            return 0.;
        }
        let res = self.residuals(srom);
        match metric {
            ErrorMetric::Sse => 0.5 * res.iter().map(|r| r * r).sum::<f64>(),
            ErrorMetric::Mean => res.iter().map(|r| r.abs()).sum::<f64>() / self.n_active as f64,
            ErrorMetric::Max => res.iter().fold(0., |acc, r| f64::max(acc, r.abs())),
        }
    }

    /// Derivatives of the class error with respect to each SROM statistic
    pub(crate) fn sensitivities(&self, metric: ErrorMetric, srom: &Array2<f64>) -> Array2<f64> {
        let res = self.residuals(srom);
        let mut sens = Array2::zeros(res.dim());
        if self.n_active == 0 {
            return sens;
        }
        match metric {
            ErrorMetric::Sse => {
                for ((d, r), s) in sens.iter_mut().zip(&res).zip(&self.scales) {
                    if *s > 0. {
                        *d = r / s;
                    }
                }
            }
            ErrorMetric::Mean => {
                let n = self.n_active as f64;
                for ((d, r), s) in sens.iter_mut().zip(&res).zip(&self.scales) {
                    if *s > 0. {
                        *d = sign(*r) / (n * s);
                    }
                }
            }
            ErrorMetric::Max => {
                let mut best: Option<((usize, usize), f64)> = None;
                for (idx, r) in res.indexed_iter() {
                    if self.scales[idx] > 0. && best.map_or(true, |(_, b)| r.abs() > b) {
                        best = Some((idx, r.abs()));
                    }
                }
                if let Some((idx, _)) = best {
                    sens[idx] = sign(res[idx]) / self.scales[idx];
                }
            }
        }
        sens
    }
}

fn sign(v: f64) -> f64 {
    if v > 0. {
        1.
    } else if v < 0. {
        -1.
    } else {
        0.
    }
}

/// Objective function measuring the discrepancy between a SROM with trial
/// parameters and a target random vector:
///
/// `w_moments * E_moments + w_cdf * E_cdf + w_corr * E_corr`
///
/// where each class error aggregates (see [ErrorMetric]) the residuals
/// `(srom_stat - target_stat) / |target_stat|`. Target statistics are computed once
/// at construction, trial evaluations do not modify the SROM.
#[derive(Clone, Debug)]
pub struct ObjectiveFunction {
    pub(crate) size: usize,
    pub(crate) dim: usize,
    pub(crate) params: SromValidParams,
    pub(crate) metric: ErrorMetric,
    /// (cdf_grid_pts, d) grid on which CDFs are compared
    pub(crate) x_grid: Array2<f64>,
    pub(crate) moments: StatTarget,
    pub(crate) cdfs: StatTarget,
    pub(crate) correlations: StatTarget,
}

impl ObjectiveFunction {
    /// Constructor given the SROM to optimize, the target random vector and
    /// the objective parameters.
    ///
    /// Fails if parameters are invalid (see [SromParams]) or if dimensions differ.
    pub fn new(srom: &Srom, target: &dyn RandomVector, params: SromParams) -> Result<Self> {
        let params = params.check()?;
        let metric = params.error();
        let dim = srom.dim();
        if target.dim() != dim {
            return Err(OptimError::InvalidValue(format!(
                "SROM dimension ({dim}) should be equal to target dimension ({})",
                target.dim()
            )));
        }
        let floor = params.scale_floor();
        let x_grid = generate_cdf_grids(target, params.cdf_grid_pts());
        let target_moments = target.compute_moments(params.max_moment())?;
        let moments = StatTarget::new(target_moments, floor, |_, _| true);
        // relative CDF errors are undefined where the target CDF vanishes
        let target_cdfs = target.compute_cdf(&x_grid.view())?;
        let cdfs = StatTarget::new(target_cdfs, floor, |_, t| t > 0.);
        let target_corr = target.compute_correlation_matrix()?;
        let correlations = StatTarget::new(target_corr, floor, |(a, b), _| a < b);
        Ok(ObjectiveFunction {
            size: srom.size(),
            dim,
            params,
            metric,
            x_grid,
            moments,
            cdfs,
            correlations,
        })
    }

    /// Validated parameters
    pub fn params(&self) -> &SromValidParams {
        &self.params
    }

    /// Grid used to compare CDFs
    pub fn x_grid(&self) -> &Array2<f64> {
        &self.x_grid
    }

    pub(crate) fn weight(&self, class: usize) -> f64 {
        self.params.obj_weights()[class]
    }

    /// Moment error of the SROM with given parameters
    pub fn compute_moment_error(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
    ) -> Result<f64> {
        let srom_moments = weighted_moments(samples, probabilities, self.params.max_moment())?;
        Ok(self.moments.error(self.metric, &srom_moments))
    }

    /// CDF error of the SROM with given parameters
    pub fn compute_cdf_error(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
    ) -> Result<f64> {
        let srom_cdfs = weighted_cdf(samples, probabilities, &self.x_grid.view())?;
        Ok(self.cdfs.error(self.metric, &srom_cdfs))
    }

    /// Correlation error of the SROM with given parameters (zero for a scalar random variable)
    pub fn compute_correlation_error(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
    ) -> Result<f64> {
        if self.dim == 1 {
            return Ok(0.);
        }
        let (_, cov) = weighted_covariance(samples, probabilities);
        Ok(self
            .correlations
            .error(self.metric, &covariance_to_correlation(&cov)))
    }

    /// Objective value for (m, d) samples and (m,) probabilities
    pub fn evaluate(
        &self,
        samples: &ArrayView2<f64>,
        probabilities: &ArrayView1<f64>,
    ) -> Result<f64> {
        if samples.dim() != (self.size, self.dim) || probabilities.len() != self.size {
            return Err(OptimError::InvalidValue(format!(
                "SROM parameters should have shapes ({}, {}) and ({},)",
                self.size, self.dim, self.size
            )));
        }
        let mut error = 0.;
        if self.weight(0) > 0. {
            error += self.weight(0) * self.compute_moment_error(samples, probabilities)?;
        }
        if self.weight(1) > 0. {
            error += self.weight(1) * self.compute_cdf_error(samples, probabilities)?;
        }
        if self.weight(2) > 0. {
            error += self.weight(2) * self.compute_correlation_error(samples, probabilities)?;
        }
        Ok(error)
    }

    /// Objective value for a flat parameter vector (see [crate::flatten_params])
    pub fn evaluate_flat(&self, x: &[f64]) -> Result<f64> {
        let (samples, probabilities) = split_params(x, self.size, self.dim)?;
        self.evaluate(&samples, &probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::{rand_distr::Uniform, RandomExt};
    use rand_xoshiro::Xoshiro256Plus;
    use srombox_target::SampleRandomVector;

    fn sample_random_vector() -> SampleRandomVector {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let samples = ndarray::Array1::random_using(10, Uniform::new(0., 1.), &mut rng);
        SampleRandomVector::new(&samples).unwrap()
    }

    #[test]
    fn test_invalid_init_parameter_values_rejected() {
        let target = sample_random_vector();
        let srom = Srom::new(10, 1).unwrap();
        let objective = |srom: &Srom, params| ObjectiveFunction::new(srom, &target, params);
        assert!(objective(&srom, SromParams::default()).is_ok());
        let two_weights = SromParams::new().obj_weights(&[1., 1.]);
        assert!(objective(&srom, two_weights).is_err());
        assert!(objective(&srom, SromParams::new().error("test")).is_err());
        let srom = Srom::new(10, 2).unwrap();
        assert!(objective(&srom, SromParams::default()).is_err());
    }

    #[test]
    fn test_exact_srom_has_zero_error() {
        let samples = array![[1., 4.], [2., 6.], [3., 5.], [4., 7.]];
        let target = SampleRandomVector::new(&samples).unwrap();
        let srom = Srom::new(4, 2).unwrap();
        let probas = array![0.25, 0.25, 0.25, 0.25];
        for metric in ["SSE", "MEAN", "MAX"] {
            let params = SromParams::new().error(metric);
            let obj = ObjectiveFunction::new(&srom, &target, params).unwrap();
            let value = obj.evaluate(&samples.view(), &probas.view()).unwrap();
            assert_abs_diff_eq!(value, 0., epsilon = 1e-12);
        }
    }

    #[test]
    fn test_moment_error_sse() {
        let target = SampleRandomVector::new(&array![1., 2., 3., 4.]).unwrap();
        let srom = Srom::new(2, 1).unwrap();
        let obj = ObjectiveFunction::new(
            &srom,
            &target,
            SromParams::new().obj_weights(&[1., 0., 0.]).max_moment(2),
        )
        .unwrap();
        // srom moments: 2.5 and 7.25 vs target 2.5 and 7.5
        let value = obj
            .evaluate(&array![[1.5], [3.5]].view(), &array![0.5, 0.5].view())
            .unwrap();
        assert_abs_diff_eq!(value, 0.5 * (0.25 / 7.5f64).powi(2), epsilon = 1e-12);
    }

    #[test]
    fn test_cdf_error_max() {
        let target = SampleRandomVector::new(&array![0., 1.]).unwrap();
        let srom = Srom::new(1, 1).unwrap();
        let obj = ObjectiveFunction::new(
            &srom,
            &target,
            SromParams::new()
                .obj_weights(&[0., 1., 0.])
                .error("max")
                .cdf_grid_pts(3),
        )
        .unwrap();
        // grid {0, 0.5, 1}: target {0.5, 0.5, 1}, srom at 1 {0, 0, 1}
        let value = obj
            .evaluate(&array![[1.]].view(), &array![1.].view())
            .unwrap();
        assert_abs_diff_eq!(value, 1., epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_error() {
        let samples = array![[1., 4.], [2., 6.], [3., 5.], [4., 7.]];
        let target = SampleRandomVector::new(&samples).unwrap();
        let srom = Srom::new(2, 2).unwrap();
        let params = SromParams::new().obj_weights(&[0., 0., 1.]);
        let obj = ObjectiveFunction::new(&srom, &target, params).unwrap();
        // perfectly correlated srom: rho = 1 vs target 0.8
        let value = obj
            .evaluate(&array![[1., 4.], [4., 7.]].view(), &array![0.5, 0.5].view())
            .unwrap();
        assert_abs_diff_eq!(value, 0.5 * (0.2f64 / 0.8).powi(2), epsilon = 1e-12);
    }
}
