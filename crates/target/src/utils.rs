//! Weighted statistics shared by every finite-support random vector
//! (discrete random vectors, SROMs and SROM surrogates).
use crate::errors::{Result, TargetError};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Dimension, Ix2};
use ndarray_stats::QuantileExt;

/// Tolerance used to check that probabilities sum to one
pub const PROBABILITY_SUM_TOL: f64 = 1e-8;

/// Converts a (n,) or (n, d) array of samples into a (n, d) matrix.
pub fn as_sample_matrix<S, D>(samples: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let matrix = match samples.ndim() {
        1 => samples
            .iter()
            .cloned()
            .collect::<Array1<f64>>()
            .insert_axis(Axis(1)),
        2 => samples
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| TargetError::InvalidValue(format!("bad shape: {e}")))?
            .to_owned(),
        n => {
            return Err(TargetError::InvalidValue(format!(
                "samples should be a 1D or 2D array, got {n} dimensions"
            )))
        }
    };
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(TargetError::InvalidValue(
            "samples should not be empty".to_string(),
        ));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(TargetError::InvalidValue(
            "samples should be finite values".to_string(),
        ));
    }
    Ok(matrix)
}

/// Checks `probabilities` is a valid distribution over `n` support points:
/// length `n`, non-negative entries summing to one.
pub fn check_probabilities(probabilities: &ArrayView1<f64>, n: usize) -> Result<()> {
    if probabilities.len() != n {
        return Err(TargetError::InvalidValue(format!(
            "probabilities length ({}) should be equal to the number of samples ({n})",
            probabilities.len()
        )));
    }
    if probabilities.iter().any(|p| !p.is_finite() || *p < 0.) {
        return Err(TargetError::InvalidValue(
            "probabilities should be non-negative".to_string(),
        ));
    }
    let sum = probabilities.sum();
    if (sum - 1.).abs() > PROBABILITY_SUM_TOL {
        return Err(TargetError::InvalidValue(format!(
            "probabilities should sum to 1, got {sum}"
        )));
    }
    Ok(())
}

/// Checks requested moment order
pub fn check_max_order(max_order: usize) -> Result<()> {
    if max_order < 1 {
        return Err(TargetError::InvalidValue(
            "max_order should be greater or equal to 1".to_string(),
        ));
    }
    Ok(())
}

/// Returns the grid of the ith component from a (n, d) or (n, 1) grid
pub fn grid_column<'a>(x_grid: &'a ArrayView2<f64>, dim: usize, i: usize) -> ArrayView1<'a, f64> {
    if x_grid.ncols() == 1 {
        x_grid.column(0)
    } else {
        debug_assert_eq!(x_grid.ncols(), dim);
        x_grid.column(i)
    }
}

/// Checks the grid has either one column shared by all components or one column per component
pub fn check_grid(x_grid: &ArrayView2<f64>, dim: usize) -> Result<()> {
    if x_grid.ncols() != 1 && x_grid.ncols() != dim {
        return Err(TargetError::InvalidValue(format!(
            "CDF grid should have 1 or {dim} columns, got {}",
            x_grid.ncols()
        )));
    }
    Ok(())
}

/// Raw moments `sum_j p_j x_ji^q` for q in `1..=max_order` as a (max_order, d) matrix
pub fn weighted_moments(
    samples: &ArrayView2<f64>,
    probabilities: &ArrayView1<f64>,
    max_order: usize,
) -> Result<Array2<f64>> {
    check_max_order(max_order)?;
    let mut moments = Array2::zeros((max_order, samples.ncols()));
    for (q, mut row) in moments.rows_mut().into_iter().enumerate() {
        let order = (q + 1) as i32;
        row.assign(&samples.mapv(|v| v.powi(order)).t().dot(probabilities));
    }
    Ok(moments)
}

/// Weighted CDF: sum of probabilities of the samples lower or equal to the grid values
pub fn weighted_cdf(
    samples: &ArrayView2<f64>,
    probabilities: &ArrayView1<f64>,
    x_grid: &ArrayView2<f64>,
) -> Result<Array2<f64>> {
    let dim = samples.ncols();
    check_grid(x_grid, dim)?;
    let mut cdf = Array2::zeros((x_grid.nrows(), dim));
    for i in 0..dim {
        let grid = grid_column(x_grid, dim, i);
        let column = samples.column(i);
        for (k, x) in grid.iter().enumerate() {
            cdf[[k, i]] = column
                .iter()
                .zip(probabilities.iter())
                .filter(|(v, _)| *v <= x)
                .map(|(_, p)| p)
                .sum();
        }
    }
    Ok(cdf)
}

/// Weighted means `mu_a = sum_j p_j x_ja` and covariances `S_ab = sum_j p_j x_ja x_jb - mu_a mu_b`.
///
/// Only the upper triangle is summed and mirrored so the result is exactly symmetric.
pub fn weighted_covariance(
    samples: &ArrayView2<f64>,
    probabilities: &ArrayView1<f64>,
) -> (Array1<f64>, Array2<f64>) {
    let mean = samples.t().dot(probabilities);
    let dim = samples.ncols();
    let mut cov = Array2::zeros((dim, dim));
    for a in 0..dim {
        for b in a..dim {
            let second: f64 = samples
                .column(a)
                .iter()
                .zip(samples.column(b))
                .zip(probabilities)
                .map(|((xa, xb), p)| p * xa * xb)
                .sum();
            let value = second - mean[a] * mean[b];
            cov[[a, b]] = value;
            cov[[b, a]] = value;
        }
    }
    (mean, cov)
}

/// Converts a covariance matrix into a Pearson correlation matrix.
///
/// Components with a non-positive variance get a zero correlation with every other component.
pub fn covariance_to_correlation(cov: &Array2<f64>) -> Array2<f64> {
    let dim = cov.nrows();
    Array2::from_shape_fn((dim, dim), |(a, b)| {
        if a == b {
            return 1.;
        }
        let (a, b) = (a.min(b), a.max(b));
        let (saa, sbb) = (cov[[a, a]], cov[[b, b]]);
        if saa > 0. && sbb > 0. {
            cov[[a, b]] / (saa * sbb).sqrt()
        } else {
            0.
        }
    })
}

/// Weighted Pearson correlation matrix
pub fn weighted_correlation(
    samples: &ArrayView2<f64>,
    probabilities: &ArrayView1<f64>,
) -> Array2<f64> {
    let (_, cov) = weighted_covariance(samples, probabilities);
    covariance_to_correlation(&cov)
}

/// Returns the (d, 2) `[min, max]` range of each column of the samples
pub fn support_bounds(samples: &ArrayView2<f64>) -> Array2<f64> {
    let mut bounds = Array2::zeros((samples.ncols(), 2));
    for (i, column) in samples.columns().into_iter().enumerate() {
        bounds[[i, 0]] = *column.min_skipnan();
        bounds[[i, 1]] = *column.max_skipnan();
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_as_sample_matrix() {
        let m = as_sample_matrix(&array![1., 2., 3.]).unwrap();
        assert_eq!(m.dim(), (3, 1));
        let m = as_sample_matrix(&array![[1., 2.], [3., 4.]]).unwrap();
        assert_eq!(m.dim(), (2, 2));
        assert!(as_sample_matrix(&Array1::<f64>::zeros(0)).is_err());
        let cube = ndarray::Array3::<f64>::zeros((2, 2, 2));
        assert!(as_sample_matrix(&cube).is_err());
    }

    #[test]
    fn test_weighted_correlation() {
        let samples = array![[1., 2.], [2., 4.], [3., 6.]];
        let probas = array![0.2, 0.3, 0.5];
        let corr = weighted_correlation(&samples.view(), &probas.view());
        assert_abs_diff_eq!(corr, array![[1., 1.], [1., 1.]], epsilon = 1e-12);

        let samples = array![[1., 2.], [2., -4.]];
        let corr = weighted_correlation(&samples.view(), &array![0.5, 0.5].view());
        assert_abs_diff_eq!(corr[[0, 1]], -1., epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_correlation_symmetry() {
        let samples = array![[1., 4.], [2., 6.], [3., 5.]];
        let probas = array![0.2, 0.3, 0.5];
        let (mean, cov) = weighted_covariance(&samples.view(), &probas.view());
        assert_abs_diff_eq!(mean, array![2.3, 5.1], epsilon = 1e-12);
        assert_eq!(cov[[0, 1]], cov[[1, 0]]);
        let corr = weighted_correlation(&samples.view(), &probas.view());
        assert_eq!(corr[[0, 1]], corr[[1, 0]]);
        assert_abs_diff_eq!(corr[[0, 1]], 0.310946708408460, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_correlation() {
        let samples = array![[1., 2.], [1., 4.]];
        let corr = weighted_correlation(&samples.view(), &array![0.5, 0.5].view());
        assert_abs_diff_eq!(corr, array![[1., 0.], [0., 1.]]);
    }

    #[test]
    fn test_support_bounds() {
        let samples = array![[1., 4.], [-2., 5.], [3., 6.]];
        let expected = array![[-2., 3.], [4., 6.]];
        assert_abs_diff_eq!(support_bounds(&samples.view()), expected);
    }

    #[test]
    fn test_check_grid() {
        let grid = Array2::<f64>::zeros((5, 3));
        assert!(check_grid(&grid.view(), 2).is_err());
        assert!(check_grid(&grid.view(), 3).is_ok());
    }
}
