//! Parser combinators for the binary NIfTI-1 header

// internal modules
use crate::header::{ByteOrder, Header};

// nom parser combinators
use nom::bytes::complete::take;
use nom::multi::fill;
use nom::number::complete::{f32, i16, i32, u8};
use nom::number::Endianness;
use nom::IResult;

/// Parse all 348 bytes of a header in a known byte order
pub(crate) fn header(i: &[u8], order: ByteOrder) -> IResult<&[u8], Header> {
    let e = order.nom();

    let (i, sizeof_hdr) = i32(e)(i)?;
    let (i, data_type) = byte_array::<10>(i)?;
    let (i, db_name) = byte_array::<18>(i)?;
    let (i, extents) = i32(e)(i)?;
    let (i, session_error) = i16(e)(i)?;
    let (i, regular) = u8(i)?;
    let (i, dim_info) = u8(i)?;
    let (i, dim) = i16_array::<8>(i, e)?;
    let (i, intent_p1) = f32(e)(i)?;
    let (i, intent_p2) = f32(e)(i)?;
    let (i, intent_p3) = f32(e)(i)?;
    let (i, intent_code) = i16(e)(i)?;
    let (i, datatype) = i16(e)(i)?;
    let (i, bitpix) = i16(e)(i)?;
    let (i, slice_start) = i16(e)(i)?;
    let (i, pixdim) = f32_array::<8>(i, e)?;
    let (i, vox_offset) = f32(e)(i)?;
    let (i, scl_slope) = f32(e)(i)?;
    let (i, scl_inter) = f32(e)(i)?;
    let (i, slice_end) = i16(e)(i)?;
    let (i, slice_code) = u8(i)?;
    let (i, xyzt_units) = u8(i)?;
    let (i, cal_max) = f32(e)(i)?;
    let (i, cal_min) = f32(e)(i)?;
    let (i, slice_duration) = f32(e)(i)?;
    let (i, toffset) = f32(e)(i)?;
    let (i, glmax) = i32(e)(i)?;
    let (i, glmin) = i32(e)(i)?;
    let (i, descrip) = byte_array::<80>(i)?;
    let (i, aux_file) = byte_array::<24>(i)?;
    let (i, qform_code) = i16(e)(i)?;
    let (i, sform_code) = i16(e)(i)?;
    let (i, quatern_b) = f32(e)(i)?;
    let (i, quatern_c) = f32(e)(i)?;
    let (i, quatern_d) = f32(e)(i)?;
    let (i, qoffset_x) = f32(e)(i)?;
    let (i, qoffset_y) = f32(e)(i)?;
    let (i, qoffset_z) = f32(e)(i)?;
    let (i, srow_x) = f32_array::<4>(i, e)?;
    let (i, srow_y) = f32_array::<4>(i, e)?;
    let (i, srow_z) = f32_array::<4>(i, e)?;
    let (i, intent_name) = byte_array::<16>(i)?;
    let (i, magic) = byte_array::<4>(i)?;

    Ok((
        i,
        Header {
            sizeof_hdr,
            data_type,
            db_name,
            extents,
            session_error,
            regular,
            dim_info,
            dim,
            intent_p1,
            intent_p2,
            intent_p3,
            intent_code,
            datatype,
            bitpix,
            slice_start,
            pixdim,
            vox_offset,
            scl_slope,
            scl_inter,
            slice_end,
            slice_code,
            xyzt_units,
            cal_max,
            cal_min,
            slice_duration,
            toffset,
            glmax,
            glmin,
            descrip,
            aux_file,
            qform_code,
            sform_code,
            quatern_b,
            quatern_c,
            quatern_d,
            qoffset_x,
            qoffset_y,
            qoffset_z,
            srow_x,
            srow_y,
            srow_z,
            intent_name,
            magic,
            byte_order: order,
        },
    ))
}

/// Fixed length run of raw bytes, e.g. the text fields
fn byte_array<const N: usize>(i: &[u8]) -> IResult<&[u8], [u8; N]> {
    let (i, bytes) = take(N)(i)?;
    let mut array = [0u8; N];
    array.copy_from_slice(bytes);
    Ok((i, array))
}

fn i16_array<const N: usize>(i: &[u8], e: Endianness) -> IResult<&[u8], [i16; N]> {
    let mut array = [0i16; N];
    let (i, ()) = fill(i16(e), &mut array)(i)?;
    Ok((i, array))
}

fn f32_array<const N: usize>(i: &[u8], e: Endianness) -> IResult<&[u8], [f32; N]> {
    let mut array = [0f32; N];
    let (i, ()) = fill(f32(e), &mut array)(i)?;
    Ok((i, array))
}
