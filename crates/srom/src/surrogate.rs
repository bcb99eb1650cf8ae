use crate::errors::{Result, SromError};
use crate::Srom;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, Ix2};
use ndarray_stats::DeviationExt;
use rand_xoshiro::Xoshiro256Plus;
use srombox_target::utils::*;
use srombox_target::{DiscreteRandomVector, RandomVector};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// SROM surrogate of a model output.
///
/// Given a SROM of the model input and the outputs of the model evaluated at each
/// SROM sample, the surrogate is the discrete random vector of the outputs
/// with the SROM probabilities. It can also be evaluated at new input points
/// as a piecewise constant model (the output of the nearest SROM sample), or as a
/// piecewise linear model when output gradients are provided.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct SromSurrogate {
    /// (m, d) SROM input samples
    inputs: Array2<f64>,
    /// (m,) SROM probabilities
    probabilities: Array1<f64>,
    /// (m, k) outputs at input samples
    outputs: Array2<f64>,
    /// (m, k * d) output gradients, the ith row is the flattened (k, d) jacobian at the ith input
    gradients: Option<Array2<f64>>,
}

impl SromSurrogate {
    /// Constructor given a SROM with initialized parameters and
    /// the outputs as a (m,) array or a (m, k) matrix where m is the SROM size.
    pub fn new<S, D>(srom: &Srom, outputs: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let (inputs, probabilities) = srom.params()?;
        let outputs = as_sample_matrix(outputs)?;
        if outputs.nrows() != srom.size() {
            return Err(SromError::InvalidValue(format!(
                "number of outputs ({}) should be equal to the SROM size ({})",
                outputs.nrows(),
                srom.size()
            )));
        }
        Ok(SromSurrogate {
            inputs: inputs.to_owned(),
            probabilities: probabilities.to_owned(),
            outputs,
            gradients: None,
        })
    }

    /// Sets output gradients as a (m, k * d) matrix turning the surrogate
    /// into a piecewise linear model.
    pub fn with_gradients(
        mut self,
        gradients: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<Self> {
        let expected = (self.size(), self.outputs.ncols() * self.inputs.ncols());
        if gradients.dim() != expected {
            return Err(SromError::InvalidValue(format!(
                "gradients shape should be {expected:?}, got {:?}",
                gradients.dim()
            )));
        }
        self.gradients = Some(gradients.to_owned());
        Ok(self)
    }

    /// Number of SROM samples
    pub fn size(&self) -> usize {
        self.inputs.nrows()
    }

    /// Outputs as a (m, k) matrix
    pub fn outputs(&self) -> &Array2<f64> {
        &self.outputs
    }

    /// Probabilities inherited from the SROM
    pub fn probabilities(&self) -> &Array1<f64> {
        &self.probabilities
    }

    /// Returns the output random vector as a discrete random vector
    pub fn to_discrete(&self) -> Result<DiscreteRandomVector> {
        let discrete = DiscreteRandomVector::new(&self.outputs, &self.probabilities)?;
        Ok(discrete)
    }

    /// Evaluates the surrogate at (n, d) input points, returns a (n, k) matrix of outputs.
    pub fn sample(&self, inputs: &ArrayView2<f64>) -> Result<Array2<f64>> {
        let dim = self.inputs.ncols();
        if inputs.ncols() != dim {
            return Err(SromError::InvalidValue(format!(
                "inputs should have {dim} columns, got {}",
                inputs.ncols()
            )));
        }
        let k = self.outputs.ncols();
        let mut outputs = Array2::zeros((inputs.nrows(), k));
        for (x, mut y) in inputs.rows().into_iter().zip(outputs.rows_mut()) {
            let nearest = self.nearest(&x)?;
            y.assign(&self.outputs.row(nearest));
            if let Some(gradients) = &self.gradients {
                let jacobian = gradients
                    .row(nearest)
                    .into_shape((k, dim))
                    .map_err(|e| SromError::InvalidValue(e.to_string()))?;
                let dx = &x - &self.inputs.row(nearest);
                y += &jacobian.dot(&dx);
            }
        }
        Ok(outputs)
    }

    /// Index of the SROM input sample closest to `x`
    fn nearest(&self, x: &ndarray::ArrayView1<f64>) -> Result<usize> {
        let mut best = (0, f64::INFINITY);
        for (i, xi) in self.inputs.axis_iter(Axis(0)).enumerate() {
            let dist = xi
                .sq_l2_dist(x)
                .map_err(|e| SromError::InvalidValue(e.to_string()))?;
            if dist < best.1 {
                best = (i, dist);
            }
        }
        Ok(best.0)
    }
}

impl RandomVector for SromSurrogate {
    fn dim(&self) -> usize {
        self.outputs.ncols()
    }

    fn compute_moments(&self, max_order: usize) -> srombox_target::Result<Array2<f64>> {
        weighted_moments(&self.outputs.view(), &self.probabilities.view(), max_order)
    }

    fn compute_cdf(&self, x_grid: &ArrayView2<f64>) -> srombox_target::Result<Array2<f64>> {
        weighted_cdf(&self.outputs.view(), &self.probabilities.view(), x_grid)
    }

    fn compute_correlation_matrix(&self) -> srombox_target::Result<Array2<f64>> {
        Ok(weighted_correlation(
            &self.outputs.view(),
            &self.probabilities.view(),
        ))
    }

    fn bounds(&self) -> Array2<f64> {
        support_bounds(&self.outputs.view())
    }

    fn draw_random_sample(
        &self,
        n: usize,
        rng: &mut Xoshiro256Plus,
    ) -> srombox_target::Result<Array2<f64>> {
        DiscreteRandomVector::new(&self.outputs, &self.probabilities)?.draw_random_sample(n, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn input_srom() -> Srom {
        let mut srom = Srom::new(3, 1).unwrap();
        srom.set_params(&array![1., 2., 4.], &array![0.5, 0.25, 0.25])
            .unwrap();
        srom
    }

    #[test]
    fn test_surrogate_statistics() {
        let surrogate = SromSurrogate::new(&input_srom(), &array![10., 20., 40.]).unwrap();
        assert_eq!(surrogate.dim(), 1);
        let moments = surrogate.compute_moments(1).unwrap();
        assert_abs_diff_eq!(moments[[0, 0]], 20.);
        let cdf = surrogate
            .compute_cdf(&array![[5.], [20.], [50.]].view())
            .unwrap();
        assert_abs_diff_eq!(cdf.column(0), array![0., 0.75, 1.]);
    }

    #[test]
    fn test_vector_outputs() {
        let outputs = array![[1., -1.], [2., -2.], [4., -4.]];
        let surrogate = SromSurrogate::new(&input_srom(), &outputs).unwrap();
        assert_eq!(surrogate.dim(), 2);
        let corr = surrogate.compute_correlation_matrix().unwrap();
        assert_abs_diff_eq!(corr[[0, 1]], -1., epsilon = 1e-12);
    }

    #[test]
    fn test_bad_outputs() {
        let outputs = array![10., 20.];
        assert!(SromSurrogate::new(&input_srom(), &outputs).is_err());
        let uninitialized = Srom::new(3, 1).unwrap();
        let outputs = array![1., 2., 3.];
        assert!(SromSurrogate::new(&uninitialized, &outputs).is_err());
    }

    #[test]
    fn test_piecewise_constant_sample() {
        let surrogate = SromSurrogate::new(&input_srom(), &array![10., 20., 40.]).unwrap();
        let inputs = array![[0.], [1.4], [1.6], [3.5]];
        let y = surrogate.sample(&inputs.view()).unwrap();
        assert_abs_diff_eq!(y.column(0), array![10., 10., 20., 40.]);
    }

    #[test]
    fn test_piecewise_linear_sample() {
        let surrogate = SromSurrogate::new(&input_srom(), &array![10., 20., 40.])
            .unwrap()
            .with_gradients(&array![[10.], [10.], [10.]])
            .unwrap();
        let y = surrogate.sample(&array![[1.4], [3.5]].view()).unwrap();
        assert_abs_diff_eq!(y.column(0), array![14., 35.], epsilon = 1e-12);
        assert!(SromSurrogate::new(&input_srom(), &array![10., 20., 40.])
            .unwrap()
            .with_gradients(&array![[1., 2.], [1., 2.], [1., 2.]])
            .is_err());
    }
}
