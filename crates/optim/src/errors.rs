use srombox_srom::SromError;
use srombox_target::TargetError;
use thiserror::Error;

/// A result type for SROM optimization errors
pub type Result<T> = std::result::Result<T, OptimError>;

/// An error raised when configuring or running a SROM optimization
#[derive(Error, Debug)]
pub enum OptimError {
    /// When a configuration value is invalid
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// When the target distribution is degenerate
    #[error("Domain error: {0}")]
    DomainError(String),
    /// When a random vector computation fails
    #[error(transparent)]
    TargetError(#[from] TargetError),
    /// When SROM handling fails
    #[error(transparent)]
    SromError(#[from] SromError),
    /// When IO fails
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    /// When configuration serialization fails
    #[error("Save error: {0}")]
    JsonError(#[from] serde_json::Error),
}
