//! Comparison of SROMs (or SROM surrogates) against their target random vector.
//!
//! Figures are not produced here: the comparison data (CDF curves, moment and
//! correlation tables) is computed for an external plotting collaborator,
//! configured with [PlotConfig](crate::PlotConfig).
use crate::errors::{Result, SromError};
use crate::SromSeries;
use ndarray::{Array, Array2};
use srombox_target::RandomVector;

/// Default number of points of the grids used to compare CDFs
pub const CDF_GRID_PTS: usize = 1000;

/// Relative errors are computed with respect to target values
/// whose magnitude is greater than this threshold, absolute errors otherwise
const RELATIVE_ERROR_FLOOR: f64 = 1e-12;

/// CDF curves of a target and of one or several SROMs on a common grid
#[derive(Clone, Debug)]
pub struct CdfComparison {
    /// (n, d) grid, the ith column is the grid of the ith dimension
    pub x_grid: Array2<f64>,
    /// (n, d) target CDF values
    pub target_cdfs: Array2<f64>,
    /// (size, (n, d) SROM CDF values) in series order
    pub srom_cdfs: Vec<(usize, Array2<f64>)>,
}

/// A statistic of a SROM compared to the one of its target
#[derive(Clone, Debug)]
pub struct StatComparison {
    /// SROM values
    pub srom: Array2<f64>,
    /// Target values
    pub target: Array2<f64>,
    /// `|srom - target| / |target|` (absolute error where the target value vanishes)
    pub error: Array2<f64>,
}

impl StatComparison {
    fn new(srom: Array2<f64>, target: Array2<f64>) -> Self {
        let mut error = &srom - &target;
        error.zip_mut_with(&target, |e, t| {
            *e = if t.abs() > RELATIVE_ERROR_FLOOR {
                e.abs() / t.abs()
            } else {
                e.abs()
            }
        });
        StatComparison {
            srom,
            target,
            error,
        }
    }

    /// Largest error
    pub fn max_error(&self) -> f64 {
        self.error.iter().cloned().fold(0., f64::max)
    }
}

/// Generates grids with `n` equally spaced points between the bounds of each
/// dimension of the target.
pub fn generate_cdf_grids(target: &dyn RandomVector, n: usize) -> Array2<f64> {
    let bounds = target.bounds();
    let mut x_grid = Array2::zeros((n, target.dim()));
    for (i, mut column) in x_grid.columns_mut().into_iter().enumerate() {
        column.assign(&Array::linspace(bounds[[i, 0]], bounds[[i, 1]], n));
    }
    x_grid
}

/// Compares a SROM against its target random vector
pub struct Postprocessor<'a> {
    srom: &'a dyn RandomVector,
    target: &'a dyn RandomVector,
}

impl<'a> Postprocessor<'a> {
    /// Constructor given a SROM (or surrogate) and the target, both of the same dimension
    pub fn new(srom: &'a dyn RandomVector, target: &'a dyn RandomVector) -> Result<Self> {
        if srom.dim() != target.dim() {
            return Err(SromError::InvalidValue(format!(
                "SROM dimension ({}) should be equal to target dimension ({})",
                srom.dim(),
                target.dim()
            )));
        }
        Ok(Postprocessor { srom, target })
    }

    /// Grids based on the target range, see [generate_cdf_grids]
    pub fn generate_cdf_grids(&self, n: usize) -> Array2<f64> {
        generate_cdf_grids(self.target, n)
    }

    /// SROM and target CDFs evaluated on `n` points grids
    pub fn compare_cdfs(&self, n: usize) -> Result<CdfComparison> {
        let x_grid = self.generate_cdf_grids(n);
        let target_cdfs = self.target.compute_cdf(&x_grid.view())?;
        let srom_cdfs = self.srom.compute_cdf(&x_grid.view())?;
        Ok(CdfComparison {
            srom_cdfs: vec![(0, srom_cdfs)],
            target_cdfs,
            x_grid,
        })
    }

    /// SROM and target moments of orders `1..=max_order`
    pub fn compare_moments(&self, max_order: usize) -> Result<StatComparison> {
        Ok(StatComparison::new(
            self.srom.compute_moments(max_order)?,
            self.target.compute_moments(max_order)?,
        ))
    }

    /// SROM and target correlation matrices
    pub fn compare_correlations(&self) -> Result<StatComparison> {
        Ok(StatComparison::new(
            self.srom.compute_correlation_matrix()?,
            self.target.compute_correlation_matrix()?,
        ))
    }

    /// CDFs of several SROMs (in series order) and of the target on `n` points grids
    pub fn compare_srom_cdfs(
        series: &SromSeries,
        target: &dyn RandomVector,
        n: usize,
    ) -> Result<CdfComparison> {
        let x_grid = generate_cdf_grids(target, n);
        let target_cdfs = target.compute_cdf(&x_grid.view())?;
        let srom_cdfs = series
            .iter()
            .map(|(size, srom)| {
                if srom.dim() != target.dim() {
                    return Err(SromError::InvalidValue(format!(
                        "SROM (m={size}) dimension should be equal to target dimension ({})",
                        target.dim()
                    )));
                }
                Ok((size, srom.compute_cdf(&x_grid.view())?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CdfComparison {
            x_grid,
            target_cdfs,
            srom_cdfs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Srom;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use srombox_target::SampleRandomVector;

    fn target() -> SampleRandomVector {
        SampleRandomVector::new(&array![1., 2., 3., 4.]).unwrap()
    }

    fn srom(size: usize) -> Srom {
        let mut srom = Srom::new(size, 1).unwrap();
        let samples = Array::linspace(1., 4., size);
        srom.set_params(&samples, &Array::from_elem(size, 1. / size as f64))
            .unwrap();
        srom
    }

    #[test]
    fn test_generate_cdf_grids() {
        let grid = generate_cdf_grids(&target(), 4);
        assert_abs_diff_eq!(grid.column(0), array![1., 2., 3., 4.]);
    }

    #[test]
    fn test_compare_exact_srom() {
        let target = target();
        let srom = srom(4);
        let post = Postprocessor::new(&srom, &target).unwrap();
        let cdfs = post.compare_cdfs(CDF_GRID_PTS).unwrap();
        assert_abs_diff_eq!(cdfs.srom_cdfs[0].1, cdfs.target_cdfs, epsilon = 1e-12);
        let moments = post.compare_moments(3).unwrap();
        assert!(moments.max_error() < 1e-12);
        let corr = post.compare_correlations().unwrap();
        assert_abs_diff_eq!(corr.max_error(), 0.);
    }

    #[test]
    fn test_compare_dimension_mismatch() {
        let target = target();
        let srom = Srom::new(2, 2).unwrap();
        assert!(Postprocessor::new(&srom, &target).is_err());
    }

    #[test]
    fn test_compare_srom_cdfs() {
        let mut series = SromSeries::new();
        series.insert(4, Box::new(srom(4)));
        series.insert(2, Box::new(srom(2)));
        let cdfs = Postprocessor::compare_srom_cdfs(&series, &target(), 100).unwrap();
        let sizes: Vec<usize> = cdfs.srom_cdfs.iter().map(|(m, _)| *m).collect();
        assert_eq!(sizes, vec![4, 2]);
        assert_eq!(cdfs.x_grid.dim(), (100, 1));
        assert_abs_diff_eq!(cdfs.srom_cdfs[1].1[[99, 0]], 1.);
    }
}
