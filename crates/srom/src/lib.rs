/*!
This library implements Stochastic Reduced Order Models (SROM).

A SROM is a small discrete random vector: `m` samples `x_k` with probabilities `p_k`
chosen so that its statistics (moments, marginal CDFs, correlations) match the ones
of a target random vector. SROM parameters are obtained by optimization
(see `srombox-optim`) or loaded from a table file with `m` rows and `d + 1` columns.

A [SromSurrogate] reuses the SROM probabilities with the outputs of an expensive
model evaluated at the SROM samples to approximate the output distribution.

Example:
```
use srombox_srom::{Srom, SromSurrogate};
use srombox_target::RandomVector;
use ndarray::array;

let mut srom = Srom::new(3, 1).expect("valid size");
srom.set_params(&array![1., 2., 4.], &array![0.5, 0.25, 0.25]).expect("valid parameters");
let mean = srom.compute_moments(1).expect("moments")[[0, 0]];
assert_eq!(mean, 2.);

// outputs of a model y = x^2 evaluated at SROM samples
let surrogate = SromSurrogate::new(&srom, &array![1., 4., 16.]).expect("surrogate");
assert_eq!(surrogate.compute_moments(1).expect("moments")[[0, 0]], 5.5);
```

The [Postprocessor] computes comparison data (CDF curves, moment and
correlation errors) of one or several SROMs, held in a [SromSeries], against the target.
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod errors;
mod plot_config;
pub mod postprocess;
mod series;
mod srom;
mod surrogate;

pub use errors::*;
pub use plot_config::*;
pub use postprocess::{CdfComparison, Postprocessor, StatComparison};
pub use series::*;
pub use srom::*;
pub use surrogate::*;
