use thiserror::Error;

/// A result type for target random vector errors
pub type Result<T> = std::result::Result<T, TargetError>;

/// An error raised when building or querying a random vector
#[derive(Error, Debug)]
pub enum TargetError {
    /// When a constructor argument or a query argument is invalid
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// When a table file cannot be read or written
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    /// When csv writing fails
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    /// When a numeric table cannot be parsed
    #[error(transparent)]
    ReadError(#[from] ndarray_csv::ReadError),
}
