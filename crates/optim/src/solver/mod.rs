//! SROM optimizer and its configuration

mod optim_config;
mod srom_optimizer;

pub use optim_config::*;
pub use srom_optimizer::*;
