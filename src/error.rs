//! Result and Error types for the sample data workflow

use std::path::PathBuf;

/// Type alias for `Result<T, nidata::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// The error type for `nidata`
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Failure to fetch or load a dataset
    #[error("failed to fetch dataset")]
    Datasets(#[from] nidata_datasets::Error),

    /// Failure to read or write a volume
    #[error("failed volume operation")]
    Volume(#[from] nidata_volume::Error),

    /// Output path exists but is something other than a directory
    #[error("output path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),
}
