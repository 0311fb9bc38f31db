//! Read operations for NIfTI-1 files
//!
//! Both plain `.nii` and gzip compressed `.nii.gz` files are supported.
//! Compression is detected from the leading bytes rather than the extension.

// standard library
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

// crate modules
use crate::error::{Error, Result};
use crate::header::{ByteOrder, HEADER_SIZE};
use crate::parsers;
use crate::volume::Volume;

// nidata modules
use nidata_format::f;

// external crates
use flate2::read::MultiGzDecoder;
use log::{debug, warn};

/// Leading bytes of any gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read a NIfTI-1 file into a [Volume]
///
/// ```rust, no_run
/// # use nidata_volume::read_volume;
/// let volume = read_volume("./sample_nifti_data/sample_mri.nii.gz").unwrap();
///
/// // Print a summary of the data
/// println!("{volume}");
/// ```
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<Volume> {
    let path = path.as_ref();
    let mut reader = init_reader(path)?;

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        MultiGzDecoder::new(bytes.as_slice()).read_to_end(&mut decoded)?;
        debug!("Decompressed to {} bytes", decoded.len());
        parse_volume(&decoded)
    } else {
        parse_volume(&bytes)
    }
}

/// Build a [Volume] from the uncompressed bytes of a NIfTI-1 file
pub fn parse_volume(bytes: &[u8]) -> Result<Volume> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::UnexpectedByteLength {
            expected: HEADER_SIZE,
            found: bytes.len(),
        });
    }

    let order = ByteOrder::detect([bytes[0], bytes[1], bytes[2], bytes[3]])?;
    let (_, header) = parsers::header(&bytes[..HEADER_SIZE], order)
        .map_err(|e| Error::ParseError(e.to_string()))?;
    header.validate()?;

    let start = header.vox_offset();
    let end = start.checked_add(header.data_byte_length()?).ok_or_else(|| {
        Error::InvalidDimensions(f!("voxel data past vox_offset {start} overflows"))
    })?;
    if bytes.len() < end {
        return Err(Error::UnexpectedByteLength {
            expected: end,
            found: bytes.len(),
        });
    }

    if bytes.len() > end {
        warn!("Ignoring {} trailing bytes after voxel data", bytes.len() - end);
    }

    Ok(Volume {
        extensions: bytes[HEADER_SIZE..start].to_vec(),
        data: bytes[start..end].to_vec(),
        header,
    })
}

/// Initialise a reader from anything that can be turned into a path
fn init_reader(path: impl AsRef<Path>) -> Result<BufReader<File>> {
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}
