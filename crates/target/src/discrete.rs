use crate::errors::{Result, TargetError};
use crate::utils::*;
use crate::RandomVector;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Dimension, Ix1};
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A random vector with a finite support: `n` sample points `x_j` in `R^d`
/// with probabilities `p_j`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct DiscreteRandomVector {
    /// (n, d) matrix of the support points
    samples: Array2<f64>,
    /// (n,) probabilities of the support points
    probabilities: Array1<f64>,
}

impl DiscreteRandomVector {
    /// Constructor given samples as a (n,) array for a scalar random variable
    /// or a (n, d) matrix, and the (n,) probabilities of each sample.
    ///
    /// Fails when shapes are inconsistent or when probabilities are negative
    /// or do not sum to one.
    pub fn new<S, D, S2>(
        samples: &ArrayBase<S, D>,
        probabilities: &ArrayBase<S2, Ix1>,
    ) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
        S2: Data<Elem = f64>,
    {
        let samples = as_sample_matrix(samples)?;
        check_probabilities(&probabilities.view(), samples.nrows())?;
        Ok(DiscreteRandomVector {
            samples,
            probabilities: probabilities.to_owned(),
        })
    }

    /// Support points as a (n, d) matrix
    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    /// Probabilities of the support points
    pub fn probabilities(&self) -> &Array1<f64> {
        &self.probabilities
    }

    /// Number of support points
    pub fn size(&self) -> usize {
        self.samples.nrows()
    }
}

impl RandomVector for DiscreteRandomVector {
    fn dim(&self) -> usize {
        self.samples.ncols()
    }

    fn compute_moments(&self, max_order: usize) -> Result<Array2<f64>> {
        weighted_moments(&self.samples.view(), &self.probabilities.view(), max_order)
    }

    fn compute_cdf(&self, x_grid: &ArrayView2<f64>) -> Result<Array2<f64>> {
        weighted_cdf(&self.samples.view(), &self.probabilities.view(), x_grid)
    }

    fn compute_correlation_matrix(&self) -> Result<Array2<f64>> {
        Ok(weighted_correlation(
            &self.samples.view(),
            &self.probabilities.view(),
        ))
    }

    fn bounds(&self) -> Array2<f64> {
        support_bounds(&self.samples.view())
    }

    fn draw_random_sample(&self, n: usize, rng: &mut Xoshiro256Plus) -> Result<Array2<f64>> {
        let index = WeightedIndex::new(self.probabilities.iter())
            .map_err(|e| TargetError::InvalidValue(format!("bad weights: {e}")))?;
        let mut drawn = Array2::zeros((n, self.dim()));
        for mut row in drawn.rows_mut() {
            row.assign(&self.samples.row(index.sample(rng)));
        }
        Ok(drawn)
    }
}
