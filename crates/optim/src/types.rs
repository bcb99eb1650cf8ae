use crate::errors::{OptimError, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};

/// A trait for functions used by internal optimizers
/// Functions are expected to be defined as `g(x, g, u)` where
/// * `x` is the input information,
/// * `g` an optional gradient information to be updated,
/// * `u` information provided by the user
pub trait ObjFn<U>: Fn(&[f64], Option<&mut [f64]>, &mut U) -> f64 {}
impl<T, U> ObjFn<U> for T where T: Fn(&[f64], Option<&mut [f64]>, &mut U) -> f64 {}

/// Flattens SROM parameters into the optimization vector
/// `[x_11, ..., x_1d, ..., x_m1, ..., x_md, p_1, ..., p_m]` of length `m * (d + 1)`.
pub fn flatten_params(samples: &ArrayView2<f64>, probabilities: &ArrayView1<f64>) -> Array1<f64> {
    let samples: Array1<f64> = samples.iter().cloned().collect();
    concatenate![Axis(0), samples, probabilities.view()]
}

/// Splits an optimization vector into (m, d) samples and (m,) probabilities views,
/// see [flatten_params]
pub fn split_params(
    x: &[f64],
    size: usize,
    dim: usize,
) -> Result<(ArrayView2<f64>, ArrayView1<f64>)> {
    if x.len() != size * (dim + 1) {
        return Err(OptimError::InvalidValue(format!(
            "parameter vector length should be {}, got {}",
            size * (dim + 1),
            x.len()
        )));
    }
    let (xs, ps) = x.split_at(size * dim);
    let samples = ArrayView2::from_shape((size, dim), xs)
        .map_err(|e| OptimError::InvalidValue(e.to_string()))?;
    Ok((samples, ArrayView1::from(ps)))
}

/// Box bounds of the optimization vector: samples within the target
/// (d, 2) bounds, probabilities within `[0, 1]`
pub fn params_bounds(target_bounds: &Array2<f64>, size: usize) -> Vec<(f64, f64)> {
    let mut bounds = Vec::with_capacity(size * (target_bounds.nrows() + 1));
    for _ in 0..size {
        for row in target_bounds.rows() {
            bounds.push((row[0], row[1]));
        }
    }
    bounds.extend(std::iter::repeat((0., 1.)).take(size));
    bounds
}

/// Restores feasibility of probabilities: negative entries are zeroed
/// then the vector is renormalized to sum to one.
pub fn project_on_simplex(probabilities: &ArrayView1<f64>) -> Array1<f64> {
    let clipped = probabilities.mapv(|p| if p.is_finite() { p.max(0.) } else { 0. });
    let sum = clipped.sum();
    if sum > 0. {
        clipped / sum
    } else {
        Array1::from_elem(probabilities.len(), 1. / probabilities.len() as f64)
    }
}

/// Clips samples within the (d, 2) target bounds
pub fn clip_samples(samples: &ArrayView2<f64>, target_bounds: &Array2<f64>) -> Array2<f64> {
    let mut clipped = samples.to_owned();
    for mut row in clipped.rows_mut() {
        for (v, bound) in row.iter_mut().zip(target_bounds.rows()) {
            *v = v.clamp(bound[0], bound[1]);
        }
    }
    clipped
}

/// SROM optimization result
#[derive(Clone, Debug)]
pub struct OptimResult {
    /// Optimized (m, d) samples
    pub samples: Array2<f64>,
    /// Optimized (m,) probabilities, summing to one
    pub probabilities: Array1<f64>,
    /// Objective value of the optimized parameters
    pub objective: f64,
    /// False when the solver stopped on its evaluation budget or failed,
    /// parameters are then the best ones found
    pub converged: bool,
    /// Solver termination status of the best try
    pub status: String,
}
