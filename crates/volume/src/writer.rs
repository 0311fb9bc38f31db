//! Write operations for NIfTI-1 files

// standard library
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// crate modules
use crate::error::Result;
use crate::header::{ByteOrder, Header, HEADER_SIZE, MIN_VOX_OFFSET};
use crate::volume::Volume;

// external crates
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;

/// Write a [Volume] to a NIfTI-1 file
///
/// Paths ending in `.gz` are gzip compressed, anything else is written as a
/// plain single file image.
///
/// The header, extension block and voxel bytes are written exactly as held
/// by the volume, in the byte order they were read in. Only `vox_offset` is
/// derived from the extension block length, with the 4 byte extension flag
/// added if the block is empty.
///
/// ```rust, no_run
/// # use nidata_volume::{read_volume, write_volume};
/// let volume = read_volume("./template.nii").unwrap();
/// write_volume(&volume, "./template.nii.gz").unwrap();
/// ```
pub fn write_volume<P: AsRef<Path>>(volume: &Volume, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = volume_bytes(volume);

    let compress = path.extension().is_some_and(|ext| ext == "gz");
    let mut writer = init_writer(path)?;

    if compress {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish()?.flush()?;
    } else {
        writer.write_all(&bytes)?;
        writer.flush()?;
    }

    debug!(
        "Wrote {} bytes{} to {}",
        bytes.len(),
        if compress { " (before compression)" } else { "" },
        path.display()
    );
    Ok(())
}

/// Serialise a [Volume] to the uncompressed bytes of a NIfTI-1 file
pub fn volume_bytes(volume: &Volume) -> Vec<u8> {
    let mut extensions = volume.extensions.clone();
    if extensions.len() < MIN_VOX_OFFSET - HEADER_SIZE {
        extensions.resize(MIN_VOX_OFFSET - HEADER_SIZE, 0);
    }

    let mut header = volume.header.clone();
    header.vox_offset = (HEADER_SIZE + extensions.len()) as f32;

    let mut bytes = header_bytes(&header);
    bytes.reserve(extensions.len() + volume.data.len());
    bytes.extend_from_slice(&extensions);
    bytes.extend_from_slice(&volume.data);
    bytes
}

/// Serialise every header field in the header's own byte order
pub(crate) fn header_bytes(header: &Header) -> Vec<u8> {
    let mut b = Buffer::new(header.byte_order);

    b.i32(header.sizeof_hdr);
    b.raw(&header.data_type);
    b.raw(&header.db_name);
    b.i32(header.extents);
    b.i16(header.session_error);
    b.raw(&[header.regular, header.dim_info]);
    header.dim.iter().for_each(|d| b.i16(*d));
    b.f32(header.intent_p1);
    b.f32(header.intent_p2);
    b.f32(header.intent_p3);
    b.i16(header.intent_code);
    b.i16(header.datatype);
    b.i16(header.bitpix);
    b.i16(header.slice_start);
    header.pixdim.iter().for_each(|p| b.f32(*p));
    b.f32(header.vox_offset);
    b.f32(header.scl_slope);
    b.f32(header.scl_inter);
    b.i16(header.slice_end);
    b.raw(&[header.slice_code, header.xyzt_units]);
    b.f32(header.cal_max);
    b.f32(header.cal_min);
    b.f32(header.slice_duration);
    b.f32(header.toffset);
    b.i32(header.glmax);
    b.i32(header.glmin);
    b.raw(&header.descrip);
    b.raw(&header.aux_file);
    b.i16(header.qform_code);
    b.i16(header.sform_code);
    b.f32(header.quatern_b);
    b.f32(header.quatern_c);
    b.f32(header.quatern_d);
    b.f32(header.qoffset_x);
    b.f32(header.qoffset_y);
    b.f32(header.qoffset_z);
    header.srow_x.iter().for_each(|v| b.f32(*v));
    header.srow_y.iter().for_each(|v| b.f32(*v));
    header.srow_z.iter().for_each(|v| b.f32(*v));
    b.raw(&header.intent_name);
    b.raw(&header.magic);

    b.bytes
}

/// Growing byte buffer that knows which byte order to write numbers in
struct Buffer {
    bytes: Vec<u8>,
    order: ByteOrder,
}

impl Buffer {
    fn new(order: ByteOrder) -> Self {
        Self {
            bytes: Vec::with_capacity(MIN_VOX_OFFSET),
            order,
        }
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn i16(&mut self, value: i16) {
        match self.order {
            ByteOrder::Little => self.raw(&value.to_le_bytes()),
            ByteOrder::Big => self.raw(&value.to_be_bytes()),
        }
    }

    fn i32(&mut self, value: i32) {
        match self.order {
            ByteOrder::Little => self.raw(&value.to_le_bytes()),
            ByteOrder::Big => self.raw(&value.to_be_bytes()),
        }
    }

    fn f32(&mut self, value: f32) {
        match self.order {
            ByteOrder::Little => self.raw(&value.to_le_bytes()),
            ByteOrder::Big => self.raw(&value.to_be_bytes()),
        }
    }
}

/// Initialise a writer from anything that can be turned into a path
fn init_writer<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    let file = File::create(path)?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::DataType;
    use crate::parsers;

    #[test]
    fn header_is_348_bytes() {
        let header = Header::new(&[3, 3, 3], DataType::Float32).unwrap();
        assert_eq!(header_bytes(&header).len(), HEADER_SIZE);
    }

    #[test]
    fn header_bytes_parse_back() {
        let mut header = Header::new(&[3, 4, 5], DataType::Int16).unwrap();
        header.byte_order = ByteOrder::Big;
        header.qform_code = 1;
        header.quatern_c = 0.5;
        header.intent_name[..3].copy_from_slice(b"abc");

        let bytes = header_bytes(&header);
        let (_, parsed) = parsers::header(&bytes, ByteOrder::Big).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn empty_extensions_are_padded() {
        let header = Header::new(&[2], DataType::Uint8).unwrap();
        let volume = Volume::new(header, vec![7, 9]).unwrap();

        let bytes = volume_bytes(&volume);
        assert_eq!(bytes.len(), MIN_VOX_OFFSET + 2);
        assert_eq!(bytes[HEADER_SIZE..MIN_VOX_OFFSET], [0u8; 4]);
        assert_eq!(bytes[MIN_VOX_OFFSET..], [7u8, 9]);
    }
}
