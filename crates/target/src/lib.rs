/*!
This library implements the target random vectors approximated by
Stochastic Reduced Order Models (SROM).

A random vector exposes a statistical interface (see [RandomVector]):
raw moments, marginal cumulative distribution functions, correlation matrix,
bounds of its support and random draws. Three kinds of random vectors are provided:
* [DiscreteRandomVector]: a finite support with given probabilities,
* [SampleRandomVector]: a set of Monte Carlo samples,
* [NormalRandomVariable]: an analytic scalar normal random variable.

Example:
```
use srombox_target::{DiscreteRandomVector, RandomVector};
use ndarray::{array, Array2};

let rv = DiscreteRandomVector::new(&array![1., 2., 3., 4.], &array![0.25, 0.25, 0.25, 0.25])
    .expect("valid discrete random vector");
let moments = rv.compute_moments(2).expect("moments");
assert_eq!(moments.dim(), (2, 1));

let x_grid = array![[0.5], [1.5], [2.5], [3.5], [4.5]];
let cdf: Array2<f64> = rv.compute_cdf(&x_grid.view()).expect("cdf");
assert_eq!(cdf[[4, 0]], 1.0);
```

Numeric tables (Monte Carlo samples, SROM parameters) are read and written
as whitespace or comma delimited text files with [read_table] and [write_table].
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod discrete;
mod errors;
mod normal;
mod sample;
mod table;
mod traits;
pub mod utils;

pub use discrete::*;
pub use errors::*;
pub use normal::*;
pub use sample::*;
pub use table::*;
pub use traits::*;
