use crate::errors::{OptimError, Result};
use crate::gradient::Gradient;
use crate::optimizers::{Minimum, Optimizer};
use crate::solver::{OptimConfig, OptimStrategy};
use crate::types::{clip_samples, flatten_params, params_bounds, project_on_simplex, OptimResult};

use log::{debug, info, warn};
use ndarray::{s, Array1, Array2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use srombox_srom::{Srom, SromSeries};
use srombox_target::RandomVector;
use std::path::Path;

/// Json filename for configuration
pub const CONFIG_FILE: &str = "srom_config.json";

/// Filename of the optimized parameters table of a SROM of size `m`
pub fn params_file(size: usize) -> String {
    format!("srom_m{size}.txt")
}

/// A candidate solution of one try
#[derive(Clone, Debug)]
struct Candidate {
    samples: Array2<f64>,
    probabilities: Array1<f64>,
    objective: f64,
    converged: bool,
    status: String,
}

/// Optimizer of SROM parameters (samples and probabilities) matching
/// the statistics of a target random vector.
///
/// ```no_run
/// use ndarray::array;
/// use srombox_optim::SromOptimizer;
/// use srombox_srom::Srom;
/// use srombox_target::SampleRandomVector;
///
/// let target = SampleRandomVector::new(&array![0.1, 0.4, 0.5, 0.9, 1.3, 2.1]).unwrap();
/// let mut srom = Srom::new(3, 1).unwrap();
/// let res = SromOptimizer::new(&target)
///     .configure(|config| config.n_tries(4).seed(42))
///     .run(&mut srom)
///     .expect("SROM optimization");
/// println!("objective = {} (converged: {})", res.objective, res.converged);
/// ```
pub struct SromOptimizer<'a> {
    target: &'a dyn RandomVector,
    config: OptimConfig,
}

impl<'a> SromOptimizer<'a> {
    /// Constructor given the target random vector
    pub fn new(target: &'a dyn RandomVector) -> Self {
        SromOptimizer {
            target,
            config: OptimConfig::default(),
        }
    }

    /// Set configuration of the optimizer
    pub fn configure<F: FnOnce(OptimConfig) -> OptimConfig>(mut self, init: F) -> Self {
        self.config = init(self.config);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &OptimConfig {
        &self.config
    }

    /// Optimizes the parameters of the given SROM and stores the result in it.
    ///
    /// Fails before any solver call when the target has a degenerate dimension
    /// or when dimensions differ. Non-convergence is reported through
    /// [OptimResult::converged], the SROM then holds the best parameters found.
    pub fn run(&self, srom: &mut Srom) -> Result<OptimResult> {
        let res = self.optimize(srom)?;
        if let Some(outdir) = &self.config.outdir {
            self.save_config(outdir)?;
            save_params(outdir, srom)?;
        }
        Ok(res)
    }

    fn optimize(&self, srom: &mut Srom) -> Result<OptimResult> {
        let (size, dim) = (srom.size(), srom.dim());
        if self.target.dim() != dim {
            return Err(OptimError::InvalidValue(format!(
                "SROM dimension ({dim}) should be equal to target dimension ({})",
                self.target.dim()
            )));
        }
        if self.config.n_tries < 1 || self.config.max_eval < 1 {
            return Err(OptimError::InvalidValue(
                "n_tries and max_eval should be greater or equal to 1".to_string(),
            ));
        }
        if let OptimStrategy::SequentialSampling { n_test_samples: 0 } = self.config.strategy {
            return Err(OptimError::InvalidValue(
                "n_test_samples should be greater or equal to 1".to_string(),
            ));
        }
        let bounds = self.target.bounds();
        check_domain(&bounds)?;
        let gradient = Gradient::new(srom, self.target, self.config.objective.clone())?;

        info!(
            "SROM optimization: size={size}, dim={dim}, algorithm={:?}, strategy={:?}, tries={}",
            self.config.algorithm, self.config.strategy, self.config.n_tries
        );
        let mut rng = match self.config.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        let seeds: Vec<u64> = (0..self.config.n_tries).map(|_| rng.gen()).collect();
        let candidates = seeds
            .into_par_iter()
            .enumerate()
            .map(|(i, seed)| -> Result<Candidate> {
                let mut rng = Xoshiro256Plus::seed_from_u64(seed);
                let candidate = match self.config.strategy {
                    OptimStrategy::Joint => self.optimize_joint(&gradient, &bounds, size, &mut rng),
                    OptimStrategy::SequentialSampling { n_test_samples } => {
                        self.optimize_sequential(&gradient, n_test_samples, size, &mut rng)
                    }
                }?;
                info!(
                    "Try {i}: objective = {:.6e} ({})",
                    candidate.objective, candidate.status
                );
                Ok(candidate)
            })
            .collect::<Result<Vec<_>>>()?;

        let best = candidates
            .into_iter()
            .reduce(|a, b| if b.objective < a.objective { b } else { a })
            .ok_or_else(|| OptimError::InvalidValue("no try".to_string()))?;

        srom.set_params(&best.samples, &best.probabilities)?;
        if best.converged {
            info!("SROM optimization converged ({:.6e})", best.objective);
        } else {
            warn!(
                "SROM optimization did not converge ({}), best objective = {:.6e}",
                best.status, best.objective
            );
        }
        Ok(OptimResult {
            samples: best.samples,
            probabilities: best.probabilities,
            objective: best.objective,
            converged: best.converged,
            status: best.status,
        })
    }

    /// Optimizes samples and probabilities together from random target draws
    /// with uniform probabilities
    fn optimize_joint(
        &self,
        gradient: &Gradient,
        bounds: &Array2<f64>,
        size: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Candidate> {
        let dim = bounds.nrows();
        let samples = clip_samples(&self.target.draw_random_sample(size, rng)?.view(), bounds);
        let probabilities = Array1::from_elem(size, 1. / size as f64);
        let xinit = flatten_params(&samples.view(), &probabilities.view());
        let xbounds = params_bounds(bounds, size);

        let obj = |x: &[f64], g: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            if let Some(g) = g {
                if let Ok(grad) = gradient.evaluate_flat(x) {
                    g.iter_mut().zip(grad.iter()).for_each(|(gi, v)| *gi = *v);
                }
            }
            gradient
                .objective()
                .evaluate_flat(x)
                .unwrap_or(f64::INFINITY)
        };
        let minimum = self
            .optimizer(&obj, &xbounds, size * dim..size * (dim + 1))
            .xinit(&xinit.view())
            .minimize();
        let x_opt = minimum.x_opt.view();
        let samples = x_opt
            .slice(s![..size * dim])
            .to_owned()
            .into_shape((size, dim))
            .map_err(|e| OptimError::InvalidValue(e.to_string()))?;
        let probabilities = x_opt.slice(s![size * dim..]).to_owned();
        self.candidate(gradient, &samples, &probabilities, &minimum, bounds)
    }

    /// Tests random sample sets drawn from the target, optimizing probabilities only
    fn optimize_sequential(
        &self,
        gradient: &Gradient,
        n_test_samples: usize,
        size: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Candidate> {
        let bounds = self.target.bounds();
        let dim = bounds.nrows();
        let xbounds = vec![(0., 1.); size];
        let pinit = Array1::from_elem(size, 1. / size as f64);
        let mut best: Option<Candidate> = None;
        for k in 0..n_test_samples {
            let samples = clip_samples(&self.target.draw_random_sample(size, rng)?.view(), &bounds);
            let obj = |p: &[f64], g: Option<&mut [f64]>, _u: &mut ()| -> f64 {
                let probabilities = ndarray::ArrayView1::from(p);
                if let Some(g) = g {
                    if let Ok(grad) = gradient.evaluate(&samples.view(), &probabilities) {
                        g.iter_mut()
                            .zip(grad.slice(s![size * dim..]))
                            .for_each(|(gi, v)| *gi = *v);
                    }
                }
                gradient
                    .objective()
                    .evaluate(&samples.view(), &probabilities)
                    .unwrap_or(f64::INFINITY)
            };
            let minimum = self
                .optimizer(&obj, &xbounds, 0..size)
                .xinit(&pinit.view())
                .minimize();
            let candidate = self.candidate(gradient, &samples, &minimum.x_opt, &minimum, &bounds)?;
            debug!("Sample set {k}: objective = {:.6e}", candidate.objective);
            let improved = best.as_ref().map(|b| candidate.objective < b.objective);
            if improved.unwrap_or(true) {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| OptimError::InvalidValue("no sample set".to_string()))
    }

    fn optimizer<'b>(
        &self,
        obj: &'b (dyn crate::types::ObjFn<()> + Sync),
        bounds: &[(f64, f64)],
        simplex: std::ops::Range<usize>,
    ) -> Optimizer<'b> {
        let mut optimizer = Optimizer::new(self.config.algorithm, obj, bounds, simplex);
        optimizer
            .max_eval(self.config.max_eval)
            .ftol_rel(self.config.ftol_rel)
            .ftol_abs(self.config.ftol_abs);
        optimizer
    }

    /// Restores feasibility of a solver output and evaluates it
    fn candidate(
        &self,
        gradient: &Gradient,
        samples: &Array2<f64>,
        probabilities: &Array1<f64>,
        minimum: &Minimum,
        bounds: &Array2<f64>,
    ) -> Result<Candidate> {
        let samples = clip_samples(&samples.view(), bounds);
        let probabilities = project_on_simplex(&probabilities.view());
        let objective = gradient
            .objective()
            .evaluate(&samples.view(), &probabilities.view())?;
        debug!(
            "Solver objective = {:.6e}, projected objective = {:.6e}",
            minimum.y_opt, objective
        );
        Ok(Candidate {
            samples,
            probabilities,
            objective,
            converged: minimum.converged,
            status: minimum.status.clone(),
        })
    }

    fn save_config(&self, outdir: &str) -> Result<()> {
        std::fs::create_dir_all(outdir)?;
        let config_path = Path::new(outdir).join(CONFIG_FILE);
        std::fs::write(&config_path, serde_json::to_string_pretty(&self.config)?)?;
        Ok(())
    }
}

fn save_params(outdir: &str, srom: &Srom) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    let params_path = Path::new(outdir).join(params_file(srom.size()));
    info!("Save SROM parameters in {:?}", params_path);
    srom.save_params(params_path)?;
    Ok(())
}

/// Checks every dimension of the (d, 2) target bounds has a finite non-zero range
fn check_domain(bounds: &Array2<f64>) -> Result<()> {
    for (i, row) in bounds.rows().into_iter().enumerate() {
        let (lower, upper) = (row[0], row[1]);
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OptimError::DomainError(format!(
                "target dimension {i} has non finite bounds [{lower}, {upper}]"
            )));
        }
        if upper <= lower {
            return Err(OptimError::DomainError(format!(
                "target dimension {i} has a zero range (value {lower})"
            )));
        }
    }
    Ok(())
}

/// Optimizes SROMs of several sizes in parallel for the same target.
///
/// Returns the optimized models as a [SromSeries] following the order of `sizes`
/// together with the corresponding optimization results. Sizes must be distinct.
/// When an output directory is configured, the configuration is written once
/// and each size writes its own parameters file.
pub fn optimize_sizes(
    target: &dyn RandomVector,
    sizes: &[usize],
    config: &OptimConfig,
) -> Result<(SromSeries, Vec<OptimResult>)> {
    for (i, size) in sizes.iter().enumerate() {
        if sizes[..i].contains(size) {
            return Err(OptimError::InvalidValue(format!(
                "SROM sizes should be distinct, size {size} is repeated"
            )));
        }
    }
    let optimizer = SromOptimizer::new(target).configure(|_| config.clone());
    if let Some(outdir) = &config.outdir {
        optimizer.save_config(outdir)?;
    }
    let optimized = sizes
        .par_iter()
        .map(|&size| -> Result<(Srom, OptimResult)> {
            let mut srom = Srom::new(size, target.dim())?;
            let res = optimizer.optimize(&mut srom)?;
            if let Some(outdir) = &config.outdir {
                save_params(outdir, &srom)?;
            }
            Ok((srom, res))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut series = SromSeries::new();
    let mut results = Vec::with_capacity(optimized.len());
    for (srom, res) in optimized {
        series.insert(srom.size(), Box::new(srom));
        results.push(res);
    }
    Ok((series, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::Algorithm;
    use crate::parameters::SromParams;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::{rand_distr::Normal, RandomExt};
    use srombox_srom::Postprocessor;
    use srombox_target::{NormalRandomVariable, SampleRandomVector};

    fn init_logger() {
        let env = env_logger::Env::new().filter_or("SROMBOX_LOG", "info");
        let mut builder = env_logger::Builder::from_env(env);
        let builder = builder.target(env_logger::Target::Stdout);
        builder.try_init().ok();
    }

    fn normal_samples(n: usize, seed: u64) -> SampleRandomVector {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let samples = Array2::random_using((n, 2), Normal::new(0., 1.).unwrap(), &mut rng);
        let correlated = ndarray::stack![
            ndarray::Axis(1),
            samples.column(0).mapv(|v| 3. + v),
            (&samples.column(0) * 0.8 + &samples.column(1) * 0.6).mapv(|v| 10. + 2. * v)
        ];
        SampleRandomVector::new(&correlated).unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        init_logger();
        let target = normal_samples(200, 0);
        let mut srom = Srom::new(5, 2).unwrap();
        let res = SromOptimizer::new(&target)
            .configure(|config| config.seed(42).max_eval(200))
            .run(&mut srom)
            .unwrap();
        assert_eq!(res.probabilities.sum(), srom.probabilities().unwrap().sum());
        assert_abs_diff_eq!(res.probabilities.sum(), 1., epsilon = 1e-12);
        assert!(res.probabilities.iter().all(|p| *p >= 0.));
        let bounds = target.bounds();
        for row in res.samples.rows() {
            for (v, b) in row.iter().zip(bounds.rows()) {
                assert!(*v >= b[0] && *v <= b[1]);
            }
        }
    }

    #[test]
    fn test_optimization_improves_initial_srom() {
        init_logger();
        let target = normal_samples(300, 1);
        let srom = Srom::new(6, 2).unwrap();
        let gradient = Gradient::new(&srom, &target, SromParams::default()).unwrap();
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let init = target.draw_random_sample(6, &mut rng).unwrap();
        let uniform = Array1::from_elem(6, 1. / 6.);
        let initial = gradient
            .objective()
            .evaluate(&init.view(), &uniform.view())
            .unwrap();

        let mut srom = Srom::new(6, 2).unwrap();
        let res = SromOptimizer::new(&target)
            .configure(|config| config.seed(42).n_tries(3))
            .run(&mut srom)
            .unwrap();
        assert!(res.objective < initial);

        let post = Postprocessor::new(&srom, &target).unwrap();
        let moments = post.compare_moments(1).unwrap();
        assert!(moments.max_error() < 0.2);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let target = normal_samples(100, 2);
        let run = || {
            let mut srom = Srom::new(4, 2).unwrap();
            SromOptimizer::new(&target)
                .configure(|config| config.seed(7).n_tries(2).max_eval(100))
                .run(&mut srom)
                .unwrap()
        };
        let (res1, res2) = (run(), run());
        assert_abs_diff_eq!(res1.samples, res2.samples);
        assert_abs_diff_eq!(res1.probabilities, res2.probabilities);
    }

    #[test]
    fn test_sequential_sampling_cobyla() {
        init_logger();
        let target = NormalRandomVariable::new(1., 0.5).unwrap();
        let mut srom = Srom::new(5, 1).unwrap();
        let res = SromOptimizer::new(&target)
            .configure(|config| {
                config
                    .algorithm(Algorithm::Cobyla)
                    .strategy(OptimStrategy::SequentialSampling { n_test_samples: 3 })
                    .objective(SromParams::new().obj_weights(&[1., 1., 0.]).max_moment(3))
                    .seed(0)
            })
            .run(&mut srom)
            .unwrap();
        assert_abs_diff_eq!(res.probabilities.sum(), 1., epsilon = 1e-12);
        assert!(res.objective.is_finite());
        assert!(srom.is_initialized());
    }

    #[test]
    fn test_degenerate_target_rejected() {
        let target = SampleRandomVector::new(&array![[1., 2.], [1., 3.], [1., 4.]]).unwrap();
        let mut srom = Srom::new(2, 2).unwrap();
        let res = SromOptimizer::new(&target).run(&mut srom);
        assert!(matches!(res, Err(OptimError::DomainError(_))));
        assert!(!srom.is_initialized());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let target = SampleRandomVector::new(&array![1., 2., 3.]).unwrap();
        let mut srom = Srom::new(2, 2).unwrap();
        assert!(SromOptimizer::new(&target).run(&mut srom).is_err());
    }

    #[test]
    fn test_outdir_results() {
        let outdir = "target/test_srom_outdir";
        let _ = std::fs::remove_dir_all(outdir);
        let target = SampleRandomVector::new(&array![0.1, 0.4, 0.5, 0.9, 1.3, 2.1]).unwrap();
        let mut srom = Srom::new(3, 1).unwrap();
        SromOptimizer::new(&target)
            .configure(|config| config.seed(42).max_eval(100).outdir(outdir))
            .run(&mut srom)
            .unwrap();
        let mut loaded = Srom::new(3, 1).unwrap();
        loaded
            .load_params(Path::new(outdir).join(params_file(3)))
            .unwrap();
        assert_abs_diff_eq!(
            loaded.samples().unwrap(),
            srom.samples().unwrap(),
            epsilon = 1e-12
        );
        let json = std::fs::read_to_string(Path::new(outdir).join(CONFIG_FILE)).unwrap();
        let config: OptimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_max_eval_reached_keeps_best_params() {
        let target = normal_samples(100, 4);
        let mut srom = Srom::new(4, 2).unwrap();
        let res = SromOptimizer::new(&target)
            .configure(|config| config.seed(3).max_eval(2))
            .run(&mut srom)
            .unwrap();
        assert!(!res.converged);
        assert_eq!(res.status, "MaxEvalReached");
        assert!(res.objective.is_finite());
        assert_abs_diff_eq!(res.probabilities.sum(), 1., epsilon = 1e-12);
        assert_eq!(srom.samples().unwrap(), &res.samples);
        assert_eq!(srom.probabilities().unwrap(), &res.probabilities);
    }

    #[test]
    fn test_optimize_sizes_duplicates_rejected() {
        let target = normal_samples(50, 5);
        let config = OptimConfig::default().seed(1).max_eval(20);
        let res = optimize_sizes(&target, &[3, 5, 3], &config);
        assert!(matches!(res, Err(OptimError::InvalidValue(_))));
    }

    #[test]
    fn test_optimize_sizes_outdir() {
        let outdir = "target/test_srom_sizes_outdir";
        let _ = std::fs::remove_dir_all(outdir);
        let target = normal_samples(50, 6);
        let config = OptimConfig::default().seed(2).max_eval(50).outdir(outdir);
        let (series, _) = optimize_sizes(&target, &[2, 4], &config).unwrap();
        assert_eq!(series.sizes(), vec![2, 4]);
        for size in [2, 4] {
            let mut loaded = Srom::new(size, 2).unwrap();
            loaded
                .load_params(Path::new(outdir).join(params_file(size)))
                .unwrap();
        }
        let json = std::fs::read_to_string(Path::new(outdir).join(CONFIG_FILE)).unwrap();
        let saved: OptimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(saved, config);
    }

    #[test]
    fn test_optimize_sizes() {
        let target = normal_samples(100, 3);
        let config = OptimConfig::default().seed(1).max_eval(100);
        let (series, results) = optimize_sizes(&target, &[6, 3, 9], &config).unwrap();
        assert_eq!(series.sizes(), vec![6, 3, 9]);
        assert_eq!(results.len(), 3);
        for (res, size) in results.iter().zip([6, 3, 9]) {
            assert_eq!(res.probabilities.len(), size);
            assert_abs_diff_eq!(res.probabilities.sum(), 1., epsilon = 1e-12);
        }
    }
}
