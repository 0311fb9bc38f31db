//! Result and Error types for the datasets module

use std::path::PathBuf;

/// Type alias for `Result<T, datasets::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// The error type for `nidata-datasets`
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Failure during a GET request
    #[error("request failed")]
    FailedRequest(#[from] minreq::Error),

    /// Server answered with something other than success
    #[error("request to {url} failed with status {status} {reason}")]
    BadStatus {
        url: String,
        status: i32,
        reason: String,
    },

    /// Failure to read a downloaded volume
    #[error("failed to load volume")]
    Volume(#[from] nidata_volume::Error),

    /// Atlas name is not one of the published variants
    #[error("unknown atlas \"{name}\", valid names are: {valid}")]
    UnknownAtlas { name: String, valid: String },

    /// Only the native template resolution is available
    #[error("resolution of {0} mm is not available, only 1 mm is supported")]
    UnsupportedResolution(u32),

    /// Expected file still missing after download and extraction
    #[error("expected file not found: {0}")]
    MissingFile(PathBuf),

    /// Generic error type for nom parser results
    #[error("parser failed: {0}")]
    ParseError(String),

    /// Progress bar could not be initialised
    #[error("failed to initialise progress bar: {0}")]
    ProgressBar(String),
}
