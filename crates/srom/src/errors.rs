use srombox_target::TargetError;
use thiserror::Error;

/// A result type for SROM errors
pub type Result<T> = std::result::Result<T, SromError>;

/// An error when building, loading or using a SROM
#[derive(Error, Debug)]
pub enum SromError {
    /// When parameters or arguments are invalid
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// When SROM parameters are used before being set, loaded or optimized
    #[error("SROM parameters are not initialized")]
    Uninitialized,
    /// When a random vector computation or a table reading fails
    #[error(transparent)]
    TargetError(#[from] TargetError),
}
