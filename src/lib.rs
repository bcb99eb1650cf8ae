//! `srombox` is a toolbox to build Stochastic Reduced Order Models (SROM).
//!
//! A SROM is a small discrete random vector, `m` samples with their probabilities,
//! whose moments, marginal CDFs and correlations approximate the ones of a target
//! random vector. SROMs are used to propagate uncertainty through expensive models:
//! the model is evaluated at the `m` SROM samples only and the outputs, weighted by
//! the SROM probabilities, approximate the output distribution.
//!
//! The toolbox is made of the following libraries, re-exported here:
//!
//! * [target]: the [target::RandomVector] statistical interface, discrete,
//!   sample-based and normal random vectors, numeric table I/O,
//! * [srom]: the SROM model, the SROM surrogate of model outputs and
//!   postprocessing data comparing SROMs with their target,
//! * [optim]: objective function, analytic gradient and optimizer of SROM parameters.
//!
//! # Example
//!
//! ```no_run
//! use ndarray::{Array1, Axis};
//! use srombox::optim::{SromOptimizer, SromParams};
//! use srombox::srom::{Srom, SromSurrogate};
//! use srombox::target::{NormalRandomVariable, RandomVector};
//!
//! // Input uncertainty
//! let target = NormalRandomVariable::new(2., 0.5).expect("valid normal");
//!
//! // 8 points SROM of the input
//! let mut srom = Srom::new(8, 1).expect("SROM");
//! let res = SromOptimizer::new(&target)
//!     .configure(|config| config.seed(42).objective(SromParams::new().max_moment(4)))
//!     .run(&mut srom)
//!     .expect("SROM optimization");
//! assert!((res.probabilities.sum() - 1.).abs() < 1e-12);
//!
//! // Expensive model evaluated at SROM samples only
//! let inputs = srom.samples().expect("optimized");
//! let outputs: Array1<f64> = inputs.index_axis(Axis(1), 0).mapv(|x| x.powi(3));
//! let surrogate = SromSurrogate::new(&srom, &outputs).expect("surrogate");
//! println!("output mean ~ {}", surrogate.compute_moments(1).expect("moments")[[0, 0]]);
//! ```
#![warn(missing_docs)]

pub use srombox_optim as optim;
pub use srombox_srom as srom;
pub use srombox_target as target;
