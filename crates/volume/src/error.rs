//! Result and Error types for the volume module

// crate modules
use crate::header::DataType;

/// Type alias for `Result<T, volume::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// The error type for `nidata-volume`
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// The first four bytes do not hold 348 in either byte order
    #[error("not a NIfTI-1 header (sizeof_hdr read as {found})")]
    UnrecognisedHeaderSize { found: i32 },

    /// Only single file NIfTI-1 images are supported
    #[error("unsupported NIfTI magic {magic:?}, expected \"n+1\"")]
    UnsupportedMagic { magic: String },

    /// Datatype code with no numeric representation here
    #[error("unsupported NIfTI datatype code {0}")]
    UnsupportedDataType(i16),

    /// Dimensions in the header make no sense
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// `bitpix` disagrees with the size of the declared datatype
    #[error("bitpix of {bitpix} does not match datatype {datatype}")]
    BitpixMismatch { datatype: DataType, bitpix: i16 },

    /// Unexpected length of bytes based on header content
    #[error("unexpected byte length (expected {expected}, found {found})")]
    UnexpectedByteLength { expected: usize, found: usize },

    /// Number of values given does not fit the reference geometry
    #[error("unexpected number of voxels (expected {expected}, found {found})")]
    UnexpectedVoxelCount { expected: usize, found: usize },

    /// Generic error type for nom parser results
    #[error("parser failed: {0}")]
    ParseError(String),
}
