// nidata modules
use nidata_format::{f, NumFormat, OptionFormat};

// internal modules
use crate::error::{Error, Result};
use crate::header::{ByteOrder, DataType, Header, MIN_VOX_OFFSET};

/// In-memory NIfTI-1 volume
///
/// A volume is kept exactly as it was stored: the parsed [Header], whatever
/// raw bytes sit between the header and the voxel offset (the extension
/// block), and the raw voxel bytes in file order and byte order.
///
/// ```text
/// <header, 348 bytes>
/// <extension block, vox_offset - 348 bytes>
/// <voxel data, product(dim) * bitpix/8 bytes>
/// ```
///
/// Nothing is decoded unless asked for with [Volume::to_f32()], so reading a
/// volume and writing it back out is lossless.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Every field of the NIfTI-1 header
    pub header: Header,
    /// Raw bytes between the header and the voxel data
    pub extensions: Vec<u8>,
    /// Raw voxel bytes, first axis varies fastest
    pub data: Vec<u8>,
}

impl Volume {
    /// Pair a header with its voxel bytes
    ///
    /// Fails if the number of bytes does not match the header dimensions.
    ///
    /// ```rust
    /// # use nidata_volume::{DataType, Header, Volume};
    /// let header = Header::new(&[2, 2, 1], DataType::Uint8).unwrap();
    /// let volume = Volume::new(header, vec![0, 1, 2, 3]).unwrap();
    /// assert_eq!(volume.shape(), vec![2, 2, 1]);
    /// ```
    pub fn new(header: Header, data: Vec<u8>) -> Result<Self> {
        let expected = header.data_byte_length()?;
        if data.len() != expected {
            return Err(Error::UnexpectedByteLength {
                expected,
                found: data.len(),
            });
        }

        Ok(Self {
            header,
            extensions: Vec::new(),
            data,
        })
    }

    /// Float32 volume sharing the geometry of a reference header
    ///
    /// Everything but the datatype, scaling and display range is copied from
    /// `reference`. The values keep the byte order of the reference.
    pub fn from_f32(reference: &Header, values: &[f32]) -> Result<Self> {
        let expected = reference.voxel_count()?;
        if values.len() != expected {
            return Err(Error::UnexpectedVoxelCount {
                expected,
                found: values.len(),
            });
        }

        let mut header = reference.clone();
        header.datatype = DataType::Float32.code();
        header.bitpix = DataType::Float32.bitpix();
        header.scl_slope = 1.0;
        header.scl_inter = 0.0;
        header.cal_min = 0.0;
        header.cal_max = 0.0;
        header.glmin = 0;
        header.glmax = 0;
        header.vox_offset = MIN_VOX_OFFSET as f32;

        let data = values
            .iter()
            .flat_map(|v| match header.byte_order {
                ByteOrder::Little => v.to_le_bytes(),
                ByteOrder::Big => v.to_be_bytes(),
            })
            .collect();

        Ok(Self {
            header,
            extensions: Vec::new(),
            data,
        })
    }

    /// Length of every used axis
    pub fn shape(&self) -> Vec<usize> {
        self.header.shape()
    }

    /// Total number of voxels
    pub fn voxel_count(&self) -> Result<usize> {
        self.header.voxel_count()
    }

    /// Numeric datatype of the stored voxels
    pub fn data_type(&self) -> Result<DataType> {
        self.header.data_type()
    }

    /// Decode every voxel to `f32`
    ///
    /// Applies `scl_slope` and `scl_inter` when the header sets them. Values
    /// are in file order, i.e. the first axis varies fastest.
    pub fn to_f32(&self) -> Result<Vec<f32>> {
        let datatype = self.data_type()?;
        let order = self.header.byte_order;

        let expected = self
            .voxel_count()?
            .checked_mul(datatype.bytes())
            .ok_or_else(|| Error::InvalidDimensions(f!("{datatype} data length overflows")))?;
        if self.data.len() != expected {
            return Err(Error::UnexpectedByteLength {
                expected,
                found: self.data.len(),
            });
        }

        let values = self
            .data
            .chunks_exact(datatype.bytes())
            .map(|chunk| decode(chunk, datatype, order));

        Ok(match self.header.scaling() {
            Some((slope, inter)) => values.map(|v| v * slope + inter).collect(),
            None => values.collect(),
        })
    }
}

/// Decode a single value, `chunk` is always exactly `datatype.bytes()` long
fn decode(chunk: &[u8], datatype: DataType, order: ByteOrder) -> f32 {
    macro_rules! read {
        ($t:ty, $n:expr) => {{
            let mut buffer = [0u8; $n];
            buffer.copy_from_slice(chunk);
            match order {
                ByteOrder::Little => <$t>::from_le_bytes(buffer),
                ByteOrder::Big => <$t>::from_be_bytes(buffer),
            }
        }};
    }

    match datatype {
        DataType::Uint8 => chunk[0] as f32,
        DataType::Int8 => chunk[0] as i8 as f32,
        DataType::Int16 => read!(i16, 2) as f32,
        DataType::Uint16 => read!(u16, 2) as f32,
        DataType::Int32 => read!(i32, 4) as f32,
        DataType::Uint32 => read!(u32, 4) as f32,
        DataType::Float32 => read!(f32, 4),
        DataType::Int64 => read!(i64, 8) as f32,
        DataType::Uint64 => read!(u64, 8) as f32,
        DataType::Float64 => read!(f64, 8) as f32,
    }
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let join = |values: Vec<String>| values.join("x");

        let datatype = match self.data_type() {
            Ok(datatype) => f!("{datatype}"),
            Err(_) => "unknown".to_string(),
        };

        let mut s = "Volume {\n".to_string();
        s += &f!("    datatype: {} ({})\n", datatype, self.header.datatype);
        s += &f!(
            "    shape: {} ({} voxels)\n",
            join(self.shape().iter().map(|n| n.to_string()).collect()),
            self.voxel_count().ok().display()
        );
        s += &f!(
            "    spacing: {}\n",
            join(self.header.spacing().iter().map(|v| v.to_string()).collect())
        );
        s += "    affine:\n";
        let affine = self.header.affine();
        for r in 0..4 {
            let row = (0..4)
                .map(|c| f!("{:>12}", affine[(r, c)].sci(4, 2)))
                .collect::<Vec<String>>()
                .join(" ");
            s += &f!("        [{row} ]\n");
        }
        s += &f!("    description: {}\n}}", self.header.description().display());

        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(datatype: DataType, order: ByteOrder, data: Vec<u8>) -> Volume {
        let mut header = Header::new(&[2, 1, 1], datatype).unwrap();
        header.byte_order = order;
        Volume::new(header, data).unwrap()
    }

    #[test]
    fn new_checks_length() {
        let header = Header::new(&[2, 2], DataType::Int16).unwrap();
        assert!(matches!(
            Volume::new(header, vec![0; 7]),
            Err(Error::UnexpectedByteLength {
                expected: 8,
                found: 7
            })
        ));
    }

    #[test]
    fn decode_big_endian_int16() {
        let mut data = (-3i16).to_be_bytes().to_vec();
        data.extend(300i16.to_be_bytes());
        let v = volume(DataType::Int16, ByteOrder::Big, data);
        assert_eq!(v.to_f32().unwrap(), vec![-3.0, 300.0]);
    }

    #[test]
    fn decode_applies_scaling() {
        let mut v = volume(DataType::Uint8, ByteOrder::Little, vec![1, 4]);
        v.header.scl_slope = 0.5;
        v.header.scl_inter = 10.0;
        assert_eq!(v.to_f32().unwrap(), vec![10.5, 12.0]);
    }

    #[test]
    fn decode_unsupported_type() {
        let mut v = volume(DataType::Uint8, ByteOrder::Little, vec![1, 4]);
        v.header.datatype = 128;
        assert!(v.to_f32().is_err());
    }

    #[test]
    fn decode_checks_data_length() {
        // bitpix says 1 byte per voxel, the datatype says 2
        let mut v = volume(DataType::Uint8, ByteOrder::Little, vec![1, 4]);
        v.header.datatype = DataType::Int16.code();
        assert!(matches!(
            v.to_f32(),
            Err(Error::UnexpectedByteLength {
                expected: 4,
                found: 2
            })
        ));
    }

    #[test]
    fn from_f32_keeps_geometry() {
        let mut reference = Header::new(&[2, 1, 1], DataType::Uint8).unwrap();
        reference.byte_order = ByteOrder::Big;
        reference.sform_code = 4;
        reference.srow_x = [2.0, 0.0, 0.0, -90.0];
        reference.cal_max = 255.0;
        reference.scl_slope = 3.0;

        let v = Volume::from_f32(&reference, &[0.25, 1.0]).unwrap();
        assert_eq!(v.header.datatype, 16);
        assert_eq!(v.header.bitpix, 32);
        assert_eq!(v.header.cal_max, 0.0);
        assert_eq!(v.header.srow_x, reference.srow_x);
        assert_eq!(v.data[..4], 0.25f32.to_be_bytes());
        assert_eq!(v.to_f32().unwrap(), vec![0.25, 1.0]);
    }

    #[test]
    fn from_f32_checks_count() {
        let reference = Header::new(&[2, 2, 2], DataType::Uint8).unwrap();
        assert!(matches!(
            Volume::from_f32(&reference, &[0.0; 7]),
            Err(Error::UnexpectedVoxelCount {
                expected: 8,
                found: 7
            })
        ));
    }

    #[test]
    fn display_summary() {
        let v = volume(DataType::Uint8, ByteOrder::Little, vec![1, 4]);
        let text = v.to_string();
        assert!(text.contains("datatype: uint8 (2)"));
        assert!(text.contains("shape: 2x1x1 (2 voxels)"));
        assert!(text.contains("description: none"));
    }
}
