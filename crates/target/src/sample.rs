use crate::errors::{Result, TargetError};
use crate::table::read_table;
use crate::utils::*;
use crate::RandomVector;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension};
use ndarray_rand::rand::{seq::index, Rng};
use ndarray_stats::CorrelationExt;
use rand_xoshiro::Xoshiro256Plus;
use std::path::Path;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A random vector defined by a set of `N` equally likely Monte Carlo samples.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct SampleRandomVector {
    /// (N, d) matrix of samples
    samples: Array2<f64>,
    /// Samples of each component sorted in ascending order (used by CDF computation)
    sorted: Vec<Array1<f64>>,
    /// (d, 2) range of the samples
    bounds: Array2<f64>,
}

impl SampleRandomVector {
    /// Constructor given a (N,) array of samples of a scalar random variable
    /// or a (N, d) matrix of samples of a random vector.
    pub fn new<S, D>(samples: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let samples = as_sample_matrix(samples)?;
        let sorted = samples
            .columns()
            .into_iter()
            .map(|column| {
                let mut values = column.to_vec();
                values.sort_by(f64::total_cmp);
                Array1::from_vec(values)
            })
            .collect();
        let bounds = support_bounds(&samples.view());
        Ok(SampleRandomVector {
            samples,
            sorted,
            bounds,
        })
    }

    /// Constructor from a table file with one sample per row
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let samples = read_table(&path)?;
        log::info!(
            "Load {} samples of dimension {} from {:?}",
            samples.nrows(),
            samples.ncols(),
            path.as_ref()
        );
        Self::new(&samples)
    }

    /// Samples as a (N, d) matrix
    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    /// Number of samples
    pub fn size(&self) -> usize {
        self.samples.nrows()
    }
}

impl RandomVector for SampleRandomVector {
    fn dim(&self) -> usize {
        self.samples.ncols()
    }

    fn compute_moments(&self, max_order: usize) -> Result<Array2<f64>> {
        check_max_order(max_order)?;
        let mut moments = Array2::zeros((max_order, self.dim()));
        for (q, mut row) in moments.rows_mut().into_iter().enumerate() {
            let order = (q + 1) as i32;
            let mean = self
                .samples
                .mapv(|v| v.powi(order))
                .mean_axis(Axis(0))
                .ok_or_else(|| TargetError::InvalidValue("no sample".to_string()))?;
            row.assign(&mean);
        }
        Ok(moments)
    }

    fn compute_cdf(&self, x_grid: &ArrayView2<f64>) -> Result<Array2<f64>> {
        let dim = self.dim();
        check_grid(x_grid, dim)?;
        let n = self.size() as f64;
        let mut cdf = Array2::zeros((x_grid.nrows(), dim));
        for (i, sorted) in self.sorted.iter().enumerate() {
            let values = sorted.as_slice().unwrap_or_default();
            for (k, x) in grid_column(x_grid, dim, i).iter().enumerate() {
                cdf[[k, i]] = values.partition_point(|v| v <= x) as f64 / n;
            }
        }
        Ok(cdf)
    }

    fn compute_correlation_matrix(&self) -> Result<Array2<f64>> {
        let dim = self.dim();
        if self.size() < 2 {
            return Ok(Array2::eye(dim));
        }
        let corr = self
            .samples
            .t()
            .pearson_correlation()
            .map_err(|e| TargetError::InvalidValue(format!("correlation: {e}")))?;
        // constant components give NaN values
        Ok(Array2::from_shape_fn((dim, dim), |(a, b)| {
            if a == b {
                1.
            } else if corr[[a, b]].is_nan() {
                0.
            } else {
                corr[[a, b]]
            }
        }))
    }

    fn bounds(&self) -> Array2<f64> {
        self.bounds.clone()
    }

    /// Draws a subset of the samples without replacement
    /// (with replacement when `n` is greater than the number of samples)
    fn draw_random_sample(&self, n: usize, rng: &mut Xoshiro256Plus) -> Result<Array2<f64>> {
        let indices: Vec<usize> = if n <= self.size() {
            index::sample(rng, self.size(), n).into_vec()
        } else {
            (0..n).map(|_| rng.gen_range(0..self.size())).collect()
        };
        Ok(self.samples.select(Axis(0), &indices))
    }
}
