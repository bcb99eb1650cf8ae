use crate::errors::{Result, TargetError};
use crate::utils::{check_grid, check_max_order, grid_column};
use crate::RandomVector;
use libm::erfc;
use ndarray::{array, Array, Array2, ArrayView2};
use ndarray_rand::{rand_distr::Normal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Number of standard deviations around the mean defining the bounds of a normal variable
pub const NORMAL_SUPPORT_SIGMAS: f64 = 5.;

/// Analytic normal random variable `N(mean, std_dev^2)`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct NormalRandomVariable {
    mean: f64,
    std_dev: f64,
}

impl NormalRandomVariable {
    /// Constructor, fails if `std_dev` is not strictly positive
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0. {
            return Err(TargetError::InvalidValue(format!(
                "normal random variable requires a finite mean and a positive standard deviation, got ({mean}, {std_dev})"
            )));
        }
        Ok(NormalRandomVariable { mean, std_dev })
    }

    /// Mean value
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    fn cdf(&self, x: f64) -> f64 {
        0.5 * erfc(-(x - self.mean) / (self.std_dev * std::f64::consts::SQRT_2))
    }
}

impl RandomVector for NormalRandomVariable {
    fn dim(&self) -> usize {
        1
    }

    /// Raw moments computed with the recurrence `m_q = mean * m_{q-1} + (q-1) * var * m_{q-2}`
    fn compute_moments(&self, max_order: usize) -> Result<Array2<f64>> {
        check_max_order(max_order)?;
        let var = self.std_dev * self.std_dev;
        let mut moments = Array2::zeros((max_order, 1));
        let (mut prev, mut current) = (1., self.mean);
        moments[[0, 0]] = current;
        for q in 2..=max_order {
            let next = self.mean * current + (q - 1) as f64 * var * prev;
            prev = current;
            current = next;
            moments[[q - 1, 0]] = current;
        }
        Ok(moments)
    }

    fn compute_cdf(&self, x_grid: &ArrayView2<f64>) -> Result<Array2<f64>> {
        check_grid(x_grid, 1)?;
        Ok(grid_column(x_grid, 1, 0)
            .mapv(|x| self.cdf(x))
            .insert_axis(ndarray::Axis(1)))
    }

    fn compute_correlation_matrix(&self) -> Result<Array2<f64>> {
        Ok(array![[1.]])
    }

    fn bounds(&self) -> Array2<f64> {
        let delta = NORMAL_SUPPORT_SIGMAS * self.std_dev;
        array![[self.mean - delta, self.mean + delta]]
    }

    fn draw_random_sample(&self, n: usize, rng: &mut Xoshiro256Plus) -> Result<Array2<f64>> {
        let normal = Normal::new(self.mean, self.std_dev)
            .map_err(|e| TargetError::InvalidValue(e.to_string()))?;
        Ok(Array::random_using((n, 1), normal, rng))
    }
}
