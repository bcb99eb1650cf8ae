use crate::errors::Result;
use ndarray::{Array2, ArrayView2};
use rand_xoshiro::Xoshiro256Plus;

/// Statistical interface of a random vector `X = (X_1, ..., X_d)`.
///
/// It is implemented by the target random vectors approximated by an SROM
/// as well as by the SROM itself, so both can be compared through the same queries.
pub trait RandomVector: Send + Sync {
    /// Dimension `d` of the random vector
    fn dim(&self) -> usize;

    /// Raw moments `E[X_i^q]` for orders `q` in `1..=max_order`.
    ///
    /// # Returns
    ///
    /// * A (max_order, d) matrix where the (q-1, i) entry is the moment of order q
    ///   of the ith component (a (max_order, 1) matrix for a scalar random variable).
    fn compute_moments(&self, max_order: usize) -> Result<Array2<f64>>;

    /// Cumulative distribution function `P(X_i <= x)` of each component
    /// evaluated on a grid.
    ///
    /// # Parameters
    ///
    /// * `x_grid`: a (n, d) matrix where the ith column is the grid of the ith component,
    ///   or a (n, 1) matrix used as the grid of every component.
    ///
    /// # Returns
    ///
    /// * A (n, d) matrix of CDF values
    fn compute_cdf(&self, x_grid: &ArrayView2<f64>) -> Result<Array2<f64>>;

    /// Pearson correlation matrix (d, d) of the components
    fn compute_correlation_matrix(&self) -> Result<Array2<f64>>;

    /// Returns a (d, 2) matrix where the ith row is the `[lower, upper]` range
    /// of the ith component. It is used to bound the SROM points and to build CDF grids.
    fn bounds(&self) -> Array2<f64>;

    /// Draws `n` realizations as a (n, d) matrix
    fn draw_random_sample(&self, n: usize, rng: &mut Xoshiro256Plus) -> Result<Array2<f64>>;
}
