use crate::errors::{Result, SromError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration handed to the plotting collaborator rendering
/// SROM vs target comparisons, one figure per dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Directory where figures are stored
    pub plot_dir: String,
    /// Figure file name prefix, the variable name and the extension are appended
    pub plot_suffix: String,
    /// Base variable name used when `variable_names` is not given
    pub variable: String,
    /// Optional variable name of each dimension
    pub variable_names: Option<Vec<String>>,
    /// Optional `[lower, upper]` x axis limits of each dimension
    pub xlimits: Option<Vec<(f64, f64)>>,
    /// Optional y axis limits of each dimension
    pub ylimits: Option<Vec<(f64, f64)>>,
    /// Optional x axis tick labels of each dimension
    pub xticks: Option<Vec<Vec<String>>>,
    /// Label the y axis as "CDF" instead of "F(x)"
    pub cdf_ylabel: bool,
    /// Show figures
    pub show: bool,
    /// Save figures
    pub save: bool,
    /// Padding between x axis and its labels
    pub xaxis_padding: f64,
    /// Axis title font size
    pub axis_font_size: f64,
    /// Tick label font size
    pub label_font_size: f64,
    /// Legend font size
    pub legend_font_size: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            plot_dir: ".".to_string(),
            plot_suffix: "CDFcompare".to_string(),
            variable: "x".to_string(),
            variable_names: None,
            xlimits: None,
            ylimits: None,
            xticks: None,
            cdf_ylabel: false,
            show: true,
            save: true,
            xaxis_padding: 5.,
            axis_font_size: 26.,
            label_font_size: 20.,
            legend_font_size: 22.,
        }
    }
}

impl PlotConfig {
    /// Returns the variable name of each of the `dim` dimensions
    pub fn variable_names(&self, dim: usize) -> Result<Vec<String>> {
        match &self.variable_names {
            Some(names) if names.len() != dim => Err(SromError::InvalidValue(format!(
                "Wrong number of variable names provided: {} for dimension {dim}",
                names.len()
            ))),
            Some(names) => Ok(names.clone()),
            None if dim == 1 => Ok(vec![self.variable.clone()]),
            None => Ok((1..=dim)
                .map(|i| format!("{}_{i}", self.variable))
                .collect()),
        }
    }

    /// Returns the figure file path of each dimension, latex `$` symbols removed
    pub fn plot_files(&self, dim: usize) -> Result<Vec<PathBuf>> {
        for (name, len) in [
            ("xlimits", self.xlimits.as_ref().map(Vec::len)),
            ("ylimits", self.ylimits.as_ref().map(Vec::len)),
            ("xticks", self.xticks.as_ref().map(Vec::len)),
        ] {
            if let Some(len) = len {
                if len != dim {
                    return Err(SromError::InvalidValue(format!(
                        "Wrong number of {name} provided: {len} for dimension {dim}"
                    )));
                }
            }
        }
        Ok(self
            .variable_names(dim)?
            .iter()
            .map(|name| {
                let file = format!("{}_{}.pdf", self.plot_suffix, name).replace('$', "");
                PathBuf::from(&self.plot_dir).join(file)
            })
            .collect())
    }
}
