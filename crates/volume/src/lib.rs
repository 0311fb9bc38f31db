//! Read and write NIfTI-1 volumes
//!
//! Volumes are held as the raw header fields plus raw voxel bytes so that a
//! file read with [read_volume()] is written back unchanged by
//! [write_volume()]. Decoding to numbers is opt-in through
//! [Volume::to_f32()].
//!
//! ```rust, no_run
//! # use nidata_volume::{read_volume, write_volume};
//! // Read a compressed volume
//! let volume = read_volume("./atlas.nii.gz").unwrap();
//! println!("{volume}");
//!
//! // Save an uncompressed copy
//! write_volume(&volume, "./atlas.nii").unwrap();
//! ```
//!
//! Only single file (`n+1`) NIfTI-1 images are supported.

// Split into subfiles for development, but anything important is re-exported
mod error;
mod header;
mod parsers;
mod reader;
mod volume;
mod writer;

// Inline anything important for a nice public API
#[doc(inline)]
pub use header::{ByteOrder, DataType, Header, HEADER_SIZE, MIN_VOX_OFFSET};

#[doc(inline)]
pub use volume::Volume;

#[doc(inline)]
pub use reader::{parse_volume, read_volume};

#[doc(inline)]
pub use writer::{volume_bytes, write_volume};

#[doc(inline)]
pub use error::{Error, Result};
