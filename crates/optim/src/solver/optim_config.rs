//! SROM optimizer configuration.
use crate::optimizers::{Algorithm, MAX_EVAL_DEFAULT};
use crate::parameters::SromParams;
use serde::{Deserialize, Serialize};

/// Strategy used to search SROM parameters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimStrategy {
    /// Samples and probabilities are optimized jointly starting from
    /// random target draws with uniform probabilities
    #[default]
    Joint,
    /// `n_test_samples` random sample sets are drawn from the target, only
    /// probabilities are optimized for each of them and the best set is kept
    SequentialSampling {
        /// Number of random sample sets tested
        n_test_samples: usize,
    },
}

/// SROM optimizer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimConfig {
    /// Solver used for each optimization
    pub(crate) algorithm: Algorithm,
    /// Search strategy
    pub(crate) strategy: OptimStrategy,
    /// Number of independent tries (best result taken), run in parallel
    pub(crate) n_tries: usize,
    /// Max number of objective evaluations of one solver run
    pub(crate) max_eval: usize,
    /// Relative tolerance on objective value used as stopping criterion
    pub(crate) ftol_rel: f64,
    /// Absolute tolerance on objective value used as stopping criterion
    pub(crate) ftol_abs: f64,
    /// A random generator seed used to get reproductible results.
    pub(crate) seed: Option<u64>,
    /// Objective function parameters
    pub(crate) objective: SromParams,
    /// Directory to save the configuration and the optimized SROM parameters
    pub(crate) outdir: Option<String>,
}

impl Default for OptimConfig {
    fn default() -> Self {
        OptimConfig {
            algorithm: Algorithm::default(),
            strategy: OptimStrategy::default(),
            n_tries: 1,
            max_eval: MAX_EVAL_DEFAULT,
            ftol_rel: 1e-8,
            ftol_abs: 0.,
            seed: None,
            objective: SromParams::default(),
            outdir: None,
        }
    }
}

impl OptimConfig {
    /// Sets the solver
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the search strategy
    pub fn strategy(mut self, strategy: OptimStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the number of tries
    pub fn n_tries(mut self, n_tries: usize) -> Self {
        self.n_tries = n_tries;
        self
    }

    /// Sets max number of objective evaluations of one solver run
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Sets relative tolerance on objective value
    pub fn ftol_rel(mut self, ftol_rel: f64) -> Self {
        self.ftol_rel = ftol_rel;
        self
    }

    /// Sets absolute tolerance on objective value
    pub fn ftol_abs(mut self, ftol_abs: f64) -> Self {
        self.ftol_abs = ftol_abs;
        self
    }

    /// Allow to specify a seed for random number generator to allow
    /// reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the objective function parameters
    pub fn objective(mut self, objective: SromParams) -> Self {
        self.objective = objective;
        self
    }

    /// Sets a directory to write optimization results
    pub fn outdir(mut self, outdir: impl Into<String>) -> Self {
        self.outdir = Some(outdir.into());
        self
    }

    /// Do not write optimization results
    pub fn no_outdir(mut self) -> Self {
        self.outdir = None;
        self
    }

    /// Objective function parameters
    pub fn objective_params(&self) -> &SromParams {
        &self.objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = OptimConfig::default()
            .algorithm(Algorithm::Cobyla)
            .strategy(OptimStrategy::SequentialSampling { n_test_samples: 5 })
            .n_tries(3)
            .seed(42)
            .objective(SromParams::new().error("max"));
        let json = serde_json::to_string(&config).unwrap();
        let loaded: OptimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }
}
