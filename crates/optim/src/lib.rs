//! This library implements the optimization of Stochastic Reduced Order Models
//! (SROM) against a target random vector.
//!
//! A SROM of size `m` is a discrete random vector with `m` support points and
//! their probabilities. Its parameters are found by minimizing a weighted sum of
//! the discrepancies between SROM and target statistics:
//!
//! * raw moments up to order `max_moment`,
//! * marginal CDFs evaluated on a grid spanning the target bounds,
//! * Pearson correlations.
//!
//! Each discrepancy is built from relative errors aggregated with an [ErrorMetric]
//! (`SSE`, `MEAN` or `MAX`), see [SromParams]. The [ObjectiveFunction] and its
//! analytic [Gradient] are minimized by [SromOptimizer] with SLSQP (or COBYLA)
//! under the constraints that probabilities sum to one and samples stay
//! within the target bounds.
//!
//! # Example
//!
//! ```no_run
//! use ndarray::Array2;
//! use ndarray_rand::{rand::SeedableRng, rand_distr::Normal, RandomExt};
//! use rand_xoshiro::Xoshiro256Plus;
//! use srombox_optim::{SromOptimizer, SromParams};
//! use srombox_srom::{Postprocessor, Srom};
//! use srombox_target::SampleRandomVector;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let samples = Array2::random_using((500, 2), Normal::new(0., 1.).unwrap(), &mut rng);
//! let target = SampleRandomVector::new(&samples).expect("valid samples");
//!
//! let mut srom = Srom::new(10, 2).expect("SROM");
//! let res = SromOptimizer::new(&target)
//!     .configure(|config| {
//!         config
//!             .n_tries(4)
//!             .seed(42)
//!             .objective(SromParams::new().obj_weights(&[1., 1., 2.]).max_moment(3))
//!     })
//!     .run(&mut srom)
//!     .expect("SROM optimization");
//! println!("objective: {} (converged: {})", res.objective, res.converged);
//!
//! let post = Postprocessor::new(&srom, &target).expect("same dimension");
//! println!("moment errors: {}", post.compare_moments(3).unwrap().error);
//! ```
#![warn(missing_docs)]
mod errors;
mod gradient;
mod objective;
mod optimizers;
mod parameters;
mod solver;
mod types;

pub use errors::*;
pub use gradient::*;
pub use objective::*;
pub use optimizers::Algorithm;
pub use parameters::*;
pub use solver::*;
pub use types::{
    clip_samples, flatten_params, params_bounds, project_on_simplex, split_params, ObjFn,
    OptimResult,
};
