//! Optimizers used internally to solve SROM parameter problems

mod optimizer;

pub use optimizer::Algorithm;
pub(crate) use optimizer::*;
