//! This module defines the data element API, which maps each pack format
//! of a data file to a primitive Rust type, and converts runs of raw bytes
//! from and to the `f32` voxels used in memory.
use crate::error::Result;
use crate::typedef::DataType;
use byteordered::{ByteOrdered, Endianness};
use num_traits::cast::AsPrimitive;
use std::io::{Read, Result as IoResult, Write};

/// Trait type for characterizing a packed voxel element, implemented for
/// the primitive numeric types of each [`DataType`].
///
/// [`DataType`]: ../../typedef/enum.DataType.html
pub trait DataElement: 'static + Sized + Copy + AsPrimitive<f32> {
    /// The `data_type` mapped to this type.
    const DATA_TYPE: DataType;

    /// Read a single element from the given byte source.
    fn read_one<R: Read>(src: &mut ByteOrdered<R, Endianness>) -> IoResult<Self>;

    /// Write a single element to the given byte sink.
    fn write_one<W: Write>(self, dst: &mut ByteOrdered<W, Endianness>) -> IoResult<()>;

    /// Convert an in-memory voxel to this type. Integral types round to the
    /// nearest integer and saturate at their bounds.
    fn from_f32(value: f32) -> Self;
}

impl DataElement for u8 {
    const DATA_TYPE: DataType = DataType::Uint8;
    fn read_one<R: Read>(src: &mut ByteOrdered<R, Endianness>) -> IoResult<Self> {
        src.read_u8()
    }
    fn write_one<W: Write>(self, dst: &mut ByteOrdered<W, Endianness>) -> IoResult<()> {
        dst.write_u8(self)
    }
    fn from_f32(value: f32) -> Self {
        value.round() as u8
    }
}

impl DataElement for i16 {
    const DATA_TYPE: DataType = DataType::Int16;
    fn read_one<R: Read>(src: &mut ByteOrdered<R, Endianness>) -> IoResult<Self> {
        src.read_i16()
    }
    fn write_one<W: Write>(self, dst: &mut ByteOrdered<W, Endianness>) -> IoResult<()> {
        dst.write_i16(self)
    }
    fn from_f32(value: f32) -> Self {
        value.round() as i16
    }
}

impl DataElement for i32 {
    const DATA_TYPE: DataType = DataType::Int32;
    fn read_one<R: Read>(src: &mut ByteOrdered<R, Endianness>) -> IoResult<Self> {
        src.read_i32()
    }
    fn write_one<W: Write>(self, dst: &mut ByteOrdered<W, Endianness>) -> IoResult<()> {
        dst.write_i32(self)
    }
    fn from_f32(value: f32) -> Self {
        value.round() as i32
    }
}

impl DataElement for f32 {
    const DATA_TYPE: DataType = DataType::Float32;
    fn read_one<R: Read>(src: &mut ByteOrdered<R, Endianness>) -> IoResult<Self> {
        src.read_f32()
    }
    fn write_one<W: Write>(self, dst: &mut ByteOrdered<W, Endianness>) -> IoResult<()> {
        dst.write_f32(self)
    }
    fn from_f32(value: f32) -> Self {
        value
    }
}

fn decode_as<T: DataElement>(raw: &[u8], out: &mut [f32], endianness: Endianness) -> Result<()> {
    debug_assert_eq!(raw.len(), out.len() * T::DATA_TYPE.size_of());
    let mut src = ByteOrdered::runtime(raw, endianness);
    for v in out.iter_mut() {
        *v = T::read_one(&mut src)?.as_();
    }
    Ok(())
}

fn encode_as<T, I>(values: I, out: &mut Vec<u8>, endianness: Endianness) -> Result<()>
where
    T: DataElement,
    I: IntoIterator<Item = f32>,
{
    let mut dst = ByteOrdered::runtime(out, endianness);
    for v in values {
        T::from_f32(v).write_one(&mut dst)?;
    }
    Ok(())
}

/// Decode `raw` bytes of the given pack format into `out`, which must hold
/// exactly one slot per packed element.
pub fn decode_into(
    data_type: DataType,
    raw: &[u8],
    out: &mut [f32],
    endianness: Endianness,
) -> Result<()> {
    match data_type {
        DataType::Uint8 => decode_as::<u8>(raw, out, endianness),
        DataType::Int16 => decode_as::<i16>(raw, out, endianness),
        DataType::Int32 => decode_as::<i32>(raw, out, endianness),
        DataType::Float32 => decode_as::<f32>(raw, out, endianness),
    }
}

/// Append the packed representation of `values` to `out`.
pub fn encode_into<I>(
    data_type: DataType,
    values: I,
    out: &mut Vec<u8>,
    endianness: Endianness,
) -> Result<()>
where
    I: IntoIterator<Item = f32>,
{
    match data_type {
        DataType::Uint8 => encode_as::<u8, _>(values, out, endianness),
        DataType::Int16 => encode_as::<i16, _>(values, out, endianness),
        DataType::Int32 => encode_as::<i32, _>(values, out, endianness),
        DataType::Float32 => encode_as::<f32, _>(values, out, endianness),
    }
}
