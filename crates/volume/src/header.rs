//! NIfTI-1 header and datatype definitions

// external crates
use nalgebra::{Matrix4, Quaternion, UnitQuaternion};

// nidata modules
use nidata_format::f;

// internal modules
use crate::error::{Error, Result};

/// Size of a NIfTI-1 header in bytes
pub const HEADER_SIZE: usize = 348;

/// Smallest valid voxel offset for a single file image
///
/// The header is always followed by the 4 byte extension flag.
pub const MIN_VOX_OFFSET: usize = 352;

/// Byte order a header (and its voxel data) was stored in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Equivalent nom endianness for the number parsers
    pub(crate) fn nom(self) -> nom::number::Endianness {
        match self {
            ByteOrder::Little => nom::number::Endianness::Little,
            ByteOrder::Big => nom::number::Endianness::Big,
        }
    }

    /// Work out the byte order from the leading `sizeof_hdr` bytes
    pub(crate) fn detect(bytes: [u8; 4]) -> Result<Self> {
        if i32::from_le_bytes(bytes) == HEADER_SIZE as i32 {
            Ok(ByteOrder::Little)
        } else if i32::from_be_bytes(bytes) == HEADER_SIZE as i32 {
            Ok(ByteOrder::Big)
        } else {
            Err(Error::UnrecognisedHeaderSize {
                found: i32::from_le_bytes(bytes),
            })
        }
    }
}

/// Numeric voxel types
///
/// Covers the real valued NIfTI-1 datatypes. Complex and RGB codes are still
/// carried through a [Header](crate::Header) unchanged, they just can not be
/// decoded into numbers.
///
/// ```rust
/// # use nidata_volume::DataType;
/// assert_eq!(DataType::from_code(16).unwrap(), DataType::Float32);
/// assert_eq!(DataType::Int16.code(), 4);
/// assert_eq!(DataType::Float64.bytes(), 8);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataType {
    /// Unsigned 8-bit integer (`2`)
    Uint8,
    /// Signed 16-bit integer (`4`)
    Int16,
    /// Signed 32-bit integer (`8`)
    Int32,
    /// 32-bit float (`16`)
    Float32,
    /// 64-bit float (`64`)
    Float64,
    /// Signed 8-bit integer (`256`)
    Int8,
    /// Unsigned 16-bit integer (`512`)
    Uint16,
    /// Unsigned 32-bit integer (`768`)
    Uint32,
    /// Signed 64-bit integer (`1024`)
    Int64,
    /// Unsigned 64-bit integer (`1280`)
    Uint64,
}

impl DataType {
    /// Get the variant for a NIfTI datatype code
    pub fn from_code(code: i16) -> Result<Self> {
        match code {
            2 => Ok(DataType::Uint8),
            4 => Ok(DataType::Int16),
            8 => Ok(DataType::Int32),
            16 => Ok(DataType::Float32),
            64 => Ok(DataType::Float64),
            256 => Ok(DataType::Int8),
            512 => Ok(DataType::Uint16),
            768 => Ok(DataType::Uint32),
            1024 => Ok(DataType::Int64),
            1280 => Ok(DataType::Uint64),
            _ => Err(Error::UnsupportedDataType(code)),
        }
    }

    /// NIfTI datatype code for the variant
    pub fn code(&self) -> i16 {
        match self {
            DataType::Uint8 => 2,
            DataType::Int16 => 4,
            DataType::Int32 => 8,
            DataType::Float32 => 16,
            DataType::Float64 => 64,
            DataType::Int8 => 256,
            DataType::Uint16 => 512,
            DataType::Uint32 => 768,
            DataType::Int64 => 1024,
            DataType::Uint64 => 1280,
        }
    }

    /// Bytes used by a single voxel value
    pub fn bytes(&self) -> usize {
        match self {
            DataType::Uint8 | DataType::Int8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Uint64 | DataType::Float64 => 8,
        }
    }

    /// Bits per voxel, as stored in `bitpix`
    pub fn bitpix(&self) -> i16 {
        (self.bytes() * 8) as i16
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            DataType::Uint8 => "uint8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Int8 => "int8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Int64 => "int64",
            DataType::Uint64 => "uint64",
        };
        write!(f, "{name}")
    }
}

/// Every field of a NIfTI-1 header
///
/// Field names follow the `nifti1.h` definitions so they are easy to look up.
/// Nothing is interpreted on read, which means a header read from a file is
/// written back out byte for byte by [write_volume()](crate::write_volume).
///
/// The byte layout is fixed at 348 bytes:
///
/// ```text
///   0  sizeof_hdr      4  data_type     14  db_name      32  extents
///  36  session_error  38  regular       39  dim_info     40  dim[8]
///  56  intent_p1..p3  68  intent_code   70  datatype     72  bitpix
///  74  slice_start    76  pixdim[8]    108  vox_offset  112  scl_slope
/// 116  scl_inter     120  slice_end    122  slice_code  123  xyzt_units
/// 124  cal_max       128  cal_min      132  slice_dur.  136  toffset
/// 140  glmax         144  glmin        148  descrip     228  aux_file
/// 252  qform_code    254  sform_code   256  quatern_b..d, qoffset_x..z
/// 280  srow_x        296  srow_y       312  srow_z      328  intent_name
/// 344  magic
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub sizeof_hdr: i32,
    pub data_type: [u8; 10],
    pub db_name: [u8; 18],
    pub extents: i32,
    pub session_error: i16,
    pub regular: u8,
    pub dim_info: u8,
    pub dim: [i16; 8],
    pub intent_p1: f32,
    pub intent_p2: f32,
    pub intent_p3: f32,
    pub intent_code: i16,
    pub datatype: i16,
    pub bitpix: i16,
    pub slice_start: i16,
    pub pixdim: [f32; 8],
    pub vox_offset: f32,
    pub scl_slope: f32,
    pub scl_inter: f32,
    pub slice_end: i16,
    pub slice_code: u8,
    pub xyzt_units: u8,
    pub cal_max: f32,
    pub cal_min: f32,
    pub slice_duration: f32,
    pub toffset: f32,
    pub glmax: i32,
    pub glmin: i32,
    pub descrip: [u8; 80],
    pub aux_file: [u8; 24],
    pub qform_code: i16,
    pub sform_code: i16,
    pub quatern_b: f32,
    pub quatern_c: f32,
    pub quatern_d: f32,
    pub qoffset_x: f32,
    pub qoffset_y: f32,
    pub qoffset_z: f32,
    pub srow_x: [f32; 4],
    pub srow_y: [f32; 4],
    pub srow_z: [f32; 4],
    pub intent_name: [u8; 16],
    pub magic: [u8; 4],
    /// Byte order of the file the header came from
    pub byte_order: ByteOrder,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            sizeof_hdr: HEADER_SIZE as i32,
            data_type: [0; 10],
            db_name: [0; 18],
            extents: 0,
            session_error: 0,
            regular: b'r',
            dim_info: 0,
            dim: [1, 1, 1, 1, 1, 1, 1, 1],
            intent_p1: 0.0,
            intent_p2: 0.0,
            intent_p3: 0.0,
            intent_code: 0,
            datatype: DataType::Uint8.code(),
            bitpix: DataType::Uint8.bitpix(),
            slice_start: 0,
            pixdim: [1.0; 8],
            vox_offset: MIN_VOX_OFFSET as f32,
            scl_slope: 1.0,
            scl_inter: 0.0,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 0,
            cal_max: 0.0,
            cal_min: 0.0,
            slice_duration: 0.0,
            toffset: 0.0,
            glmax: 0,
            glmin: 0,
            descrip: [0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.0,
            quatern_c: 0.0,
            quatern_d: 0.0,
            qoffset_x: 0.0,
            qoffset_y: 0.0,
            qoffset_z: 0.0,
            srow_x: [0.0; 4],
            srow_y: [0.0; 4],
            srow_z: [0.0; 4],
            intent_name: [0; 16],
            magic: *b"n+1\0",
            byte_order: ByteOrder::Little,
        }
    }
}

impl Header {
    /// New little endian header for a given shape and datatype
    ///
    /// Voxels are 1 mm isotropic and no qform/sform is set.
    ///
    /// ```rust
    /// # use nidata_volume::{DataType, Header};
    /// let header = Header::new(&[4, 5, 6], DataType::Int16).unwrap();
    /// assert_eq!(header.shape(), vec![4, 5, 6]);
    /// assert_eq!(header.data_byte_length().unwrap(), 4 * 5 * 6 * 2);
    /// ```
    pub fn new(shape: &[usize], datatype: DataType) -> Result<Self> {
        if shape.is_empty() || shape.len() > 7 {
            return Err(Error::InvalidDimensions(f!(
                "{} dimensions given, expected 1 to 7",
                shape.len()
            )));
        }

        let mut header = Self {
            datatype: datatype.code(),
            bitpix: datatype.bitpix(),
            ..Default::default()
        };

        header.dim[0] = shape.len() as i16;
        for (d, n) in header.dim[1..].iter_mut().zip(shape) {
            *d = i16::try_from(*n)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::InvalidDimensions(f!("{n} is not a valid axis length")))?;
        }

        Ok(header)
    }

    /// Number of dimensions, from `dim[0]`
    pub fn ndim(&self) -> usize {
        self.dim[0].clamp(0, 7) as usize
    }

    /// Length of every used axis
    pub fn shape(&self) -> Vec<usize> {
        self.dim[1..=self.ndim()]
            .iter()
            .map(|d| (*d).max(0) as usize)
            .collect()
    }

    /// Grid spacings of every used axis
    pub fn spacing(&self) -> Vec<f32> {
        self.pixdim[1..=self.ndim()].to_vec()
    }

    /// Total number of voxels
    ///
    /// Fails if the axis lengths multiply out past `usize::MAX`.
    pub fn voxel_count(&self) -> Result<usize> {
        self.shape()
            .iter()
            .try_fold(1usize, |total, n| total.checked_mul(*n))
            .ok_or_else(|| {
                Error::InvalidDimensions(f!("voxel count overflows for dim {:?}", self.dim))
            })
    }

    /// Number of bytes of voxel data implied by the header
    pub fn data_byte_length(&self) -> Result<usize> {
        self.voxel_count()?
            .checked_mul(self.bitpix.max(0) as usize / 8)
            .ok_or_else(|| {
                Error::InvalidDimensions(f!(
                    "byte length overflows for dim {:?} at bitpix {}",
                    self.dim,
                    self.bitpix
                ))
            })
    }

    /// Numeric datatype of the voxels
    pub fn data_type(&self) -> Result<DataType> {
        DataType::from_code(self.datatype)
    }

    /// Voxel offset as a byte count
    pub fn vox_offset(&self) -> usize {
        if self.vox_offset.is_finite() && self.vox_offset > 0.0 {
            self.vox_offset as usize
        } else {
            0
        }
    }

    /// Description string with the trailing null padding removed
    pub fn description(&self) -> Option<String> {
        let end = self
            .descrip
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.descrip.len());
        let text = String::from_utf8_lossy(&self.descrip[..end]).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// Magic string with the trailing null removed
    pub fn magic(&self) -> String {
        String::from_utf8_lossy(&self.magic)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Scaling to apply to stored values, if any
    ///
    /// A zero or non-finite slope means the stored values are used as-is.
    pub fn scaling(&self) -> Option<(f32, f32)> {
        let slope = self.scl_slope;
        let inter = if self.scl_inter.is_finite() {
            self.scl_inter
        } else {
            0.0
        };

        if slope == 0.0 || !slope.is_finite() || (slope == 1.0 && inter == 0.0) {
            None
        } else {
            Some((slope, inter))
        }
    }

    /// Sanity check everything needed to locate the voxel data
    pub fn validate(&self) -> Result<()> {
        if self.magic() != "n+1" {
            return Err(Error::UnsupportedMagic {
                magic: self.magic(),
            });
        }

        if !(1..=7).contains(&self.dim[0]) {
            return Err(Error::InvalidDimensions(f!(
                "dim[0] is {}, expected 1 to 7",
                self.dim[0]
            )));
        }

        if let Some(d) = self.dim[1..=self.ndim()].iter().find(|d| **d <= 0) {
            return Err(Error::InvalidDimensions(f!(
                "axis length {d} in {:?}",
                self.dim
            )));
        }

        if self.bitpix <= 0 || self.bitpix % 8 != 0 {
            return Err(Error::InvalidDimensions(f!("bitpix of {}", self.bitpix)));
        }

        // complex and RGB codes are carried through without a bitpix check
        if let Ok(datatype) = self.data_type() {
            if datatype.bitpix() != self.bitpix {
                return Err(Error::BitpixMismatch {
                    datatype,
                    bitpix: self.bitpix,
                });
            }
        }

        self.data_byte_length()?;

        if self.vox_offset() < HEADER_SIZE {
            return Err(Error::UnexpectedByteLength {
                expected: HEADER_SIZE,
                found: self.vox_offset(),
            });
        }

        Ok(())
    }

    /// Voxel to world transform
    ///
    /// Uses the sform if set, then the qform, and finally falls back to a plain
    /// scaling by the voxel spacing.
    pub fn affine(&self) -> Matrix4<f64> {
        if self.sform_code > 0 {
            self.sform_affine()
        } else if self.qform_code > 0 {
            self.qform_affine()
        } else {
            Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(
                self.pixdim[1] as f64,
                self.pixdim[2] as f64,
                self.pixdim[3] as f64,
            ))
        }
    }

    fn sform_affine(&self) -> Matrix4<f64> {
        let row = |r: &[f32; 4]| r.map(|v| v as f64);
        let (x, y, z) = (row(&self.srow_x), row(&self.srow_y), row(&self.srow_z));

        #[rustfmt::skip]
        let affine = Matrix4::new(
            x[0], x[1], x[2], x[3],
            y[0], y[1], y[2], y[3],
            z[0], z[1], z[2], z[3],
            0.0,  0.0,  0.0,  1.0,
        );
        affine
    }

    fn qform_affine(&self) -> Matrix4<f64> {
        let (b, c, d) = (
            self.quatern_b as f64,
            self.quatern_c as f64,
            self.quatern_d as f64,
        );
        // rounding can push the implied `a` slightly imaginary
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(a, b, c, d))
            .to_rotation_matrix()
            .into_inner();

        let qfac = if self.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let scale = nalgebra::Vector3::new(
            self.pixdim[1] as f64,
            self.pixdim[2] as f64,
            self.pixdim[3] as f64 * qfac,
        );

        let mut affine = Matrix4::identity();
        for r in 0..3 {
            for c in 0..3 {
                affine[(r, c)] = rotation[(r, c)] * scale[c];
            }
        }
        affine[(0, 3)] = self.qoffset_x as f64;
        affine[(1, 3)] = self.qoffset_y as f64;
        affine[(2, 3)] = self.qoffset_z as f64;
        affine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_byte_order() {
        assert_eq!(
            ByteOrder::detect(348i32.to_le_bytes()).unwrap(),
            ByteOrder::Little
        );
        assert_eq!(
            ByteOrder::detect(348i32.to_be_bytes()).unwrap(),
            ByteOrder::Big
        );
        assert!(ByteOrder::detect(540i32.to_le_bytes()).is_err());
    }

    #[test]
    fn unknown_datatype_code() {
        assert!(matches!(
            DataType::from_code(128),
            Err(Error::UnsupportedDataType(128))
        ));
    }

    #[test]
    fn new_rejects_bad_shapes() {
        assert!(Header::new(&[], DataType::Uint8).is_err());
        assert!(Header::new(&[1; 8], DataType::Uint8).is_err());
        assert!(Header::new(&[4, 0, 2], DataType::Uint8).is_err());
        assert!(Header::new(&[40_000], DataType::Uint8).is_err());
    }

    #[test]
    fn overflowing_dimensions_are_an_error() {
        let mut header = Header::new(&[2, 2, 2], DataType::Int16).unwrap();
        header.dim = [i16::MAX; 8];
        header.dim[0] = 7;

        assert!(matches!(
            header.voxel_count(),
            Err(Error::InvalidDimensions(_))
        ));
        assert!(matches!(
            header.data_byte_length(),
            Err(Error::InvalidDimensions(_))
        ));
        assert!(matches!(header.validate(), Err(Error::InvalidDimensions(_))));
    }

    #[test]
    fn bitpix_must_match_datatype() {
        let mut header = Header::new(&[2, 2, 2], DataType::Float32).unwrap();
        assert!(header.validate().is_ok());

        header.bitpix = 16;
        assert!(matches!(
            header.validate(),
            Err(Error::BitpixMismatch {
                datatype: DataType::Float32,
                bitpix: 16
            })
        ));

        // codes without a numeric type only need whole bytes
        header.datatype = 128;
        header.bitpix = 24;
        assert!(header.validate().is_ok());
    }

    #[test]
    fn affine_prefers_sform() {
        let mut header = Header::new(&[2, 2, 2], DataType::Uint8).unwrap();
        header.sform_code = 4;
        header.srow_x = [-1.0, 0.0, 0.0, 90.0];
        header.srow_y = [0.0, 1.0, 0.0, -126.0];
        header.srow_z = [0.0, 0.0, 1.0, -72.0];
        header.qform_code = 1;

        let affine = header.affine();
        assert_eq!(affine[(0, 0)], -1.0);
        assert_eq!(affine[(0, 3)], 90.0);
        assert_eq!(affine[(1, 3)], -126.0);
        assert_eq!(affine[(3, 3)], 1.0);
    }

    #[test]
    fn affine_from_qform() {
        let mut header = Header::new(&[2, 2, 2], DataType::Uint8).unwrap();
        header.qform_code = 1;
        header.pixdim = [-1.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 0.0];
        header.qoffset_x = 10.0;

        // identity rotation with a flipped z axis from qfac
        let affine = header.affine();
        assert!((affine[(0, 0)] - 2.0).abs() < 1e-9);
        assert!((affine[(1, 1)] - 2.0).abs() < 1e-9);
        assert!((affine[(2, 2)] + 2.0).abs() < 1e-9);
        assert_eq!(affine[(0, 3)], 10.0);
    }

    #[test]
    fn affine_falls_back_to_spacing() {
        let mut header = Header::new(&[2, 2, 2], DataType::Uint8).unwrap();
        header.pixdim[1] = 3.0;
        assert_eq!(header.affine()[(0, 0)], 3.0);
        assert_eq!(header.affine()[(1, 1)], 1.0);
    }

    #[test]
    fn scaling_is_ignored_when_trivial() {
        let mut header = Header::default();
        assert_eq!(header.scaling(), None);
        header.scl_slope = 0.0;
        assert_eq!(header.scaling(), None);
        header.scl_slope = f32::NAN;
        assert_eq!(header.scaling(), None);
        header.scl_slope = 2.0;
        header.scl_inter = 1.0;
        assert_eq!(header.scaling(), Some((2.0, 1.0)));
    }

    #[test]
    fn description_trims_padding() {
        let mut header = Header::default();
        assert_eq!(header.description(), None);
        header.descrip[..5].copy_from_slice(b"atlas");
        assert_eq!(header.description().as_deref(), Some("atlas"));
    }
}
