use crate::errors::{OptimError, Result};
use linfa::ParamGuard;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default number of moments matched by the objective
pub const DEFAULT_MAX_MOMENT: usize = 5;
/// Default number of points of the CDF grid of each dimension
pub const DEFAULT_CDF_GRID_PTS: usize = 100;
/// Default magnitude below which a target statistic is not used as a scaling factor
pub const DEFAULT_SCALE_FLOOR: f64 = 1e-12;

/// Metric aggregating the normalized errors of a class of statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorMetric {
    /// Half sum of squared errors
    #[default]
    Sse,
    /// Mean of absolute errors
    Mean,
    /// Max of absolute errors
    Max,
}

impl FromStr for ErrorMetric {
    type Err = OptimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SSE" => Ok(ErrorMetric::Sse),
            "MEAN" => Ok(ErrorMetric::Mean),
            "MAX" => Ok(ErrorMetric::Max),
            _ => Err(OptimError::InvalidValue(format!(
                "error metric should be one of 'SSE', 'MEAN' or 'MAX', got '{s}'"
            ))),
        }
    }
}

/// A set of validated objective parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SromValidParams {
    /// Weights of the moment, CDF and correlation errors
    pub(crate) obj_weights: Vec<f64>,
    /// Error metric
    pub(crate) error: ErrorMetric,
    /// Highest moment order matched
    pub(crate) max_moment: usize,
    /// Number of points of the CDF grid of each dimension
    pub(crate) cdf_grid_pts: usize,
    /// Target statistics smaller than this value in magnitude are not used for scaling
    pub(crate) scale_floor: f64,
}

impl Default for SromValidParams {
    fn default() -> Self {
        SromValidParams {
            obj_weights: vec![1., 1., 1.],
            error: ErrorMetric::default(),
            max_moment: DEFAULT_MAX_MOMENT,
            cdf_grid_pts: DEFAULT_CDF_GRID_PTS,
            scale_floor: DEFAULT_SCALE_FLOOR,
        }
    }
}

impl SromValidParams {
    /// Weights of the moment, CDF and correlation errors
    pub fn obj_weights(&self) -> &[f64] {
        &self.obj_weights
    }

    /// Error metric
    pub fn error(&self) -> ErrorMetric {
        self.error
    }

    /// Highest moment order matched
    pub fn max_moment(&self) -> usize {
        self.max_moment
    }

    /// Number of points of the CDF grid
    pub fn cdf_grid_pts(&self) -> usize {
        self.cdf_grid_pts
    }

    /// Scaling floor
    pub fn scale_floor(&self) -> f64 {
        self.scale_floor
    }
}

/// The set of parameters of the SROM objective function and its gradient.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SromParams {
    #[serde(flatten)]
    valid: SromValidParams,
    /// Unknown metric name given to [SromParams::error], reported by the check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_error: Option<String>,
}

impl SromParams {
    /// Constructor with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set weights of the moment, CDF and correlation errors (3 values expected).
    pub fn obj_weights(mut self, obj_weights: &[f64]) -> Self {
        self.valid.obj_weights = obj_weights.to_vec();
        self
    }

    /// Set error metric by name: `"SSE"`, `"MEAN"` or `"MAX"` (case insensitive)
    pub fn error(mut self, error: &str) -> Self {
        match error.parse::<ErrorMetric>() {
            Ok(metric) => {
                self.valid.error = metric;
                self.invalid_error = None;
            }
            Err(_) => self.invalid_error = Some(error.to_string()),
        }
        self
    }

    /// Set error metric
    pub fn error_metric(mut self, error: ErrorMetric) -> Self {
        self.valid.error = error;
        self.invalid_error = None;
        self
    }

    /// Set highest moment order matched
    pub fn max_moment(mut self, max_moment: usize) -> Self {
        self.valid.max_moment = max_moment;
        self
    }

    /// Set the number of points of the CDF grid
    pub fn cdf_grid_pts(mut self, cdf_grid_pts: usize) -> Self {
        self.valid.cdf_grid_pts = cdf_grid_pts;
        self
    }

    /// Set the scaling floor
    pub fn scale_floor(mut self, scale_floor: f64) -> Self {
        self.valid.scale_floor = scale_floor;
        self
    }
}

impl ParamGuard for SromParams {
    type Checked = SromValidParams;
    type Error = OptimError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let weights = &self.valid.obj_weights;
        if weights.len() != 3 {
            return Err(OptimError::InvalidValue(format!(
                "obj_weights should have 3 values (moments, CDF, correlation), got {}",
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.) {
            return Err(OptimError::InvalidValue(
                "obj_weights should be non-negative".to_string(),
            ));
        }
        if let Some(name) = &self.invalid_error {
            name.parse::<ErrorMetric>()?;
        }
        if self.valid.max_moment < 1 {
            return Err(OptimError::InvalidValue(
                "max_moment should be greater or equal to 1".to_string(),
            ));
        }
        if self.valid.cdf_grid_pts < 2 {
            return Err(OptimError::InvalidValue(
                "cdf_grid_pts should be greater or equal to 2".to_string(),
            ));
        }
        if !(self.valid.scale_floor >= 0.) {
            return Err(OptimError::InvalidValue(
                "scale_floor should be non-negative".to_string(),
            ));
        }
        Ok(&self.valid)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.valid)
    }
}
