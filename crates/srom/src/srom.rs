use crate::errors::{Result, SromError};
use ndarray::{concatenate, s, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, Ix1};
use rand_xoshiro::Xoshiro256Plus;
use srombox_target::utils::*;
use srombox_target::{read_table, write_table, DiscreteRandomVector, RandomVector, TargetError};
use std::path::Path;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Stochastic Reduced Order Model: a random vector with `size` support points
/// `x_k` in `R^dim` and probabilities `p_k`.
///
/// A SROM is created with its size and dimension only, its parameters are
/// then either loaded from a table file, set programmatically or optimized
/// to approximate a target random vector.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Srom {
    size: usize,
    dim: usize,
    /// (size, dim) support points
    samples: Option<Array2<f64>>,
    /// (size,) probabilities
    probabilities: Option<Array1<f64>>,
}

impl Srom {
    /// Constructor of an uninitialized SROM of given size and dimension
    pub fn new(size: usize, dim: usize) -> Result<Self> {
        if size == 0 || dim == 0 {
            return Err(SromError::InvalidValue(format!(
                "SROM size and dimension should be positive, got ({size}, {dim})"
            )));
        }
        Ok(Srom {
            size,
            dim,
            samples: None,
            probabilities: None,
        })
    }

    /// Number of support points
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether parameters have been set
    pub fn is_initialized(&self) -> bool {
        self.samples.is_some() && self.probabilities.is_some()
    }

    /// Sets SROM parameters given (size, dim) samples (or (size,) when dim is 1)
    /// and (size,) probabilities.
    pub fn set_params<S, D, S2>(
        &mut self,
        samples: &ArrayBase<S, D>,
        probabilities: &ArrayBase<S2, Ix1>,
    ) -> Result<()>
    where
        S: Data<Elem = f64>,
        D: Dimension,
        S2: Data<Elem = f64>,
    {
        let samples = as_sample_matrix(samples)?;
        if samples.dim() != (self.size, self.dim) {
            return Err(SromError::InvalidValue(format!(
                "SROM samples shape should be ({}, {}), got {:?}",
                self.size,
                self.dim,
                samples.dim()
            )));
        }
        check_probabilities(&probabilities.view(), self.size)?;
        self.samples = Some(samples);
        self.probabilities = Some(probabilities.to_owned());
        Ok(())
    }

    /// Returns (samples, probabilities) parameters
    pub fn params(&self) -> Result<(&Array2<f64>, &Array1<f64>)> {
        match (&self.samples, &self.probabilities) {
            (Some(samples), Some(probabilities)) => Ok((samples, probabilities)),
            _ => Err(SromError::Uninitialized),
        }
    }

    /// Support points as a (size, dim) matrix
    pub fn samples(&self) -> Result<&Array2<f64>> {
        Ok(self.params()?.0)
    }

    /// Probabilities of the support points
    pub fn probabilities(&self) -> Result<&Array1<f64>> {
        Ok(self.params()?.1)
    }

    /// Loads parameters from a table with `size` rows and `dim + 1` columns:
    /// the coordinates of a support point followed by its probability.
    pub fn load_params<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let table = read_table(&path)?;
        self.set_params_from_table(&table.view())?;
        let path = path.as_ref();
        log::info!("SROM (m={}) parameters loaded from {path:?}", self.size);
        Ok(())
    }

    /// Sets parameters from a (size, dim + 1) table, see [Srom::load_params]
    pub fn set_params_from_table(&mut self, table: &ArrayView2<f64>) -> Result<()> {
        if table.nrows() != self.size {
            return Err(SromError::InvalidValue(format!(
                "SROM parameters table should have {} rows, got {}",
                self.size,
                table.nrows()
            )));
        }
        if table.ncols() != self.dim + 1 {
            return Err(SromError::InvalidValue(format!(
                "SROM parameters table should have {} columns, got {}",
                self.dim + 1,
                table.ncols()
            )));
        }
        self.set_params(&table.slice(s![.., ..self.dim]), &table.column(self.dim))
    }

    /// Returns the (size, dim + 1) parameters table
    pub fn params_table(&self) -> Result<Array2<f64>> {
        let (samples, probabilities) = self.params()?;
        Ok(concatenate![
            Axis(1),
            samples.view(),
            probabilities.view().insert_axis(Axis(1))
        ])
    }

    /// Saves parameters as a space delimited table, see [Srom::load_params]
    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_table(&path, &self.params_table()?)?;
        let path = path.as_ref();
        log::info!("SROM (m={}) parameters saved to {path:?}", self.size);
        Ok(())
    }

    /// Returns the SROM as a discrete random vector
    pub fn to_discrete(&self) -> Result<DiscreteRandomVector> {
        let (samples, probabilities) = self.params()?;
        Ok(DiscreteRandomVector::new(samples, probabilities)?)
    }

    fn checked_params(&self) -> srombox_target::Result<(&Array2<f64>, &Array1<f64>)> {
        self.params()
            .map_err(|e| TargetError::InvalidValue(e.to_string()))
    }
}

impl RandomVector for Srom {
    fn dim(&self) -> usize {
        self.dim
    }

    fn compute_moments(&self, max_order: usize) -> srombox_target::Result<Array2<f64>> {
        let (samples, probabilities) = self.checked_params()?;
        weighted_moments(&samples.view(), &probabilities.view(), max_order)
    }

    fn compute_cdf(&self, x_grid: &ArrayView2<f64>) -> srombox_target::Result<Array2<f64>> {
        let (samples, probabilities) = self.checked_params()?;
        weighted_cdf(&samples.view(), &probabilities.view(), x_grid)
    }

    fn compute_correlation_matrix(&self) -> srombox_target::Result<Array2<f64>> {
        let (samples, probabilities) = self.checked_params()?;
        Ok(weighted_correlation(&samples.view(), &probabilities.view()))
    }

    /// Range of the support points (NaN values when parameters are not set)
    fn bounds(&self) -> Array2<f64> {
        match &self.samples {
            Some(samples) => support_bounds(&samples.view()),
            None => Array2::from_elem((self.dim, 2), f64::NAN),
        }
    }

    fn draw_random_sample(
        &self,
        n: usize,
        rng: &mut Xoshiro256Plus,
    ) -> srombox_target::Result<Array2<f64>> {
        let (samples, probabilities) = self.checked_params()?;
        DiscreteRandomVector::new(samples, probabilities)?.draw_random_sample(n, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn srom_2d() -> Srom {
        let mut srom = Srom::new(3, 2).unwrap();
        srom.set_params(
            &array![[1., 4.], [2., 6.], [3., 5.]],
            &array![0.2, 0.3, 0.5],
        )
        .unwrap();
        srom
    }

    #[test]
    fn test_uninitialized() {
        let srom = Srom::new(10, 1).unwrap();
        assert!(!srom.is_initialized());
        assert!(matches!(srom.params(), Err(SromError::Uninitialized)));
        assert!(srom.compute_moments(2).is_err());
        assert!(Srom::new(0, 1).is_err());
    }

    #[test]
    fn test_set_params_validation() {
        let mut srom = Srom::new(3, 2).unwrap();
        let probas = array![0.2, 0.3, 0.5];
        let samples = array![[1., 2.], [3., 4.]];
        assert!(srom.set_params(&samples, &probas).is_err());
        assert!(srom.set_params(&array![1., 2., 3.], &probas).is_err());
        let samples = array![[1., 4.], [2., 6.], [3., 5.]];
        assert!(srom.set_params(&samples, &array![0.2, 0.3, 0.6]).is_err());
        assert!(srom.set_params(&samples, &array![0.7, 0.5, -0.2]).is_err());
        assert!(srom.set_params(&samples, &array![0.5, 0.5]).is_err());
        assert!(srom.set_params(&samples, &probas).is_ok());
    }

    #[test]
    fn test_srom_statistics() {
        let srom = srom_2d();
        let moments = srom.compute_moments(2).unwrap();
        assert_abs_diff_eq!(moments.row(0), array![2.3, 5.1], epsilon = 1e-12);
        assert_abs_diff_eq!(moments.row(1), array![5.9, 26.5], epsilon = 1e-12);
        let cdf = srom.compute_cdf(&array![[2., 5.]].view()).unwrap();
        assert_abs_diff_eq!(cdf.row(0), array![0.5, 0.7], epsilon = 1e-12);
        let corr = srom.compute_correlation_matrix().unwrap();
        assert_eq!(corr[[0, 1]], corr[[1, 0]]);
        assert_abs_diff_eq!(corr[[0, 1]], 0.310946708408460, epsilon = 1e-12);
        assert_abs_diff_eq!(srom.bounds(), array![[1., 3.], [4., 6.]]);
    }

    #[test]
    fn test_draw_random_sample() {
        use ndarray_rand::rand::SeedableRng;
        let mut srom = Srom::new(2, 1).unwrap();
        srom.set_params(&array![1., 2.], &array![1., 0.]).unwrap();
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let drawn = srom.draw_random_sample(5, &mut rng).unwrap();
        assert_eq!(drawn, Array2::from_elem((5, 1), 1.));
        assert!(Srom::new(2, 1)
            .unwrap()
            .draw_random_sample(5, &mut rng)
            .is_err());
    }

    #[test]
    fn test_load_params_twice() {
        let dir = std::env::temp_dir().join("srombox_srom_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("srom_m3.txt");
        srom_2d().save_params(&path).unwrap();

        let mut srom1 = Srom::new(3, 2).unwrap();
        srom1.load_params(&path).unwrap();
        let mut srom2 = Srom::new(3, 2).unwrap();
        srom2.load_params(&path).unwrap();
        assert_eq!(srom1.params().unwrap(), srom2.params().unwrap());
        assert_eq!(
            srom1.compute_moments(5).unwrap(),
            srom2.compute_moments(5).unwrap()
        );
        assert_eq!(
            srom1.compute_correlation_matrix().unwrap(),
            srom2.compute_correlation_matrix().unwrap()
        );
        assert_eq!(srom1.params().unwrap(), srom_2d().params().unwrap());
    }

    #[test]
    fn test_load_params_bad_shape() {
        let dir = std::env::temp_dir().join("srombox_srom_bad");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("srom_m3.txt");
        srom_2d().save_params(&path).unwrap();

        let mut srom = Srom::new(4, 2).unwrap();
        assert!(srom.load_params(&path).is_err());
        let mut srom = Srom::new(3, 1).unwrap();
        assert!(srom.load_params(&path).is_err());
        assert!(!srom.is_initialized());
    }
}
