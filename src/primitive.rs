//! Stateless primitive writers
//!
//! Every function writes one value at `offset` and returns the number of
//! bytes written. Capacity is checked before the first byte is touched, so a
//! failed call leaves the buffer unchanged.

use crate::error::{Error, Result};
use crate::tag::{self, type_code, LengthClass};

/// Encoded size of a boolean
pub const BOOLEAN_LEN: usize = 1;

/// Encoded size of a 64-bit integer
pub const INT64_LEN: usize = 1 + 8;

/// Encoded size of a 32-bit float
pub const FLOAT32_LEN: usize = 1 + 4;

/// Encoded size of a 64-bit float
pub const FLOAT64_LEN: usize = 1 + 8;

/// Borrow `buf[offset..offset + len]` or fail with `BufferOverflow`
#[inline]
pub(crate) fn reserve(buf: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= buf.len() => Ok(&mut buf[offset..end]),
        _ => Err(Error::overflow(buf, offset, len)),
    }
}

/// Write a boolean as a single lead byte
#[inline]
pub fn write_boolean(buf: &mut [u8], offset: usize, value: bool) -> Result<usize> {
    let dst = reserve(buf, offset, BOOLEAN_LEN)?;
    dst[0] = if value { tag::TRUE } else { tag::FALSE };
    Ok(BOOLEAN_LEN)
}

/// Write a 64-bit integer (big-endian two's complement)
#[inline]
pub fn write_int64(buf: &mut [u8], offset: usize, value: i64) -> Result<usize> {
    let dst = reserve(buf, offset, INT64_LEN)?;
    dst[0] = tag::INT64;
    dst[1..].copy_from_slice(&value.to_be_bytes());
    Ok(INT64_LEN)
}

/// Write a 32-bit IEEE-754 float (big-endian)
#[inline]
pub fn write_float32(buf: &mut [u8], offset: usize, value: f32) -> Result<usize> {
    let dst = reserve(buf, offset, FLOAT32_LEN)?;
    dst[0] = tag::FLOAT32;
    dst[1..].copy_from_slice(&value.to_bits().to_be_bytes());
    Ok(FLOAT32_LEN)
}

/// Write a 64-bit IEEE-754 float (big-endian)
#[inline]
pub fn write_float64(buf: &mut [u8], offset: usize, value: f64) -> Result<usize> {
    let dst = reserve(buf, offset, FLOAT64_LEN)?;
    dst[0] = tag::FLOAT64;
    dst[1..].copy_from_slice(&value.to_bits().to_be_bytes());
    Ok(FLOAT64_LEN)
}

/// Encoded size of a UTF-8 string
///
/// Strings too long for any length class are sized as if they used the
/// widest one; writing them still fails.
#[inline]
pub fn utf8_len(value: &str) -> usize {
    let class = LengthClass::for_len(value.len()).unwrap_or(LengthClass::U32);
    1 + class.width() + value.len()
}

/// Write a UTF-8 string
///
/// The length field uses the smallest [`LengthClass`] that holds the byte
/// length of `value`.
#[inline]
pub fn write_utf8(buf: &mut [u8], offset: usize, value: &str) -> Result<usize> {
    let bytes = value.as_bytes();
    let class = LengthClass::for_len(bytes.len())?;
    let total = 1 + class.width() + bytes.len();

    let dst = reserve(buf, offset, total)?;
    dst[0] = tag::lead(type_code::UTF8, class.width() as u8);
    class.put(bytes.len(), &mut dst[1..]);
    dst[1 + class.width()..].copy_from_slice(bytes);
    Ok(total)
}

/// Copy pre-encoded bytes verbatim
#[inline]
pub fn write_direct(buf: &mut [u8], offset: usize, raw: &[u8]) -> Result<usize> {
    let dst = reserve(buf, offset, raw.len())?;
    dst.copy_from_slice(raw);
    Ok(raw.len())
}
