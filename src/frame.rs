//! Object framing: reserve a length placeholder, backpatch it later
//!
//! ```text
//! +---------+-----------------------+------------------------------+
//! | 0xA0|W  | length (W bytes, BE)  | key/value pairs (length)     |
//! +---------+-----------------------+------------------------------+
//! ^ start                           ^ content_start
//! ```
//!
//! The placeholder width `W` is fixed by the [`LengthClass`] passed to
//! [`write_object_begin`]. It cannot grow afterwards without shifting the
//! content, so [`write_object_end`] rejects lengths the class cannot hold.

use crate::error::{Error, Result};
use crate::primitive::reserve;
use crate::tag::{self, type_code, LengthClass};

/// Lead byte of an object with the given placeholder width
#[inline]
pub const fn object_lead(class: LengthClass) -> u8 {
    tag::lead(type_code::OBJECT, class.width() as u8)
}

/// Bytes taken by the lead byte plus placeholder
#[inline]
pub const fn header_len(class: LengthClass) -> usize {
    1 + class.width()
}

/// Write an object lead byte and a zeroed length placeholder
///
/// Returns the number of bytes written (lead byte + placeholder).
#[inline]
pub fn write_object_begin(buf: &mut [u8], offset: usize, class: LengthClass) -> Result<usize> {
    let len = header_len(class);
    let dst = reserve(buf, offset, len)?;
    dst[0] = object_lead(class);
    dst[1..].fill(0);
    Ok(len)
}

/// Backpatch the placeholder of the object starting at `object_start`
///
/// No bytes are shifted. The placeholder keeps its zero value on error.
#[inline]
pub fn write_object_end(
    buf: &mut [u8],
    object_start: usize,
    class: LengthClass,
    content_len: usize,
) -> Result<()> {
    class.check(content_len)?;

    let header = header_len(class);
    let end = object_start
        .checked_add(header)
        .and_then(|content_start| content_start.checked_add(content_len));
    match end {
        Some(end) if end <= buf.len() => {}
        _ => {
            let needed = header.saturating_add(content_len);
            return Err(Error::overflow(buf, object_start, needed));
        }
    }

    if buf[object_start] != object_lead(class) {
        return Err(Error::FrameMismatch {
            offset: object_start,
        });
    }

    class.put(content_len, &mut buf[object_start + 1..]);
    Ok(())
}

/// An object whose placeholder is reserved but not yet backpatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an open frame must be closed to backpatch its length"]
pub struct ObjectFrame {
    start: usize,
    content_start: usize,
    class: LengthClass,
}

impl ObjectFrame {
    /// Open a frame at `offset`
    #[inline]
    pub fn begin(buf: &mut [u8], offset: usize, class: LengthClass) -> Result<Self> {
        let header = write_object_begin(buf, offset, class)?;
        Ok(Self {
            start: offset,
            content_start: offset + header,
            class,
        })
    }

    /// Offset of the object lead byte
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset of the first content byte
    #[inline]
    pub fn content_start(&self) -> usize {
        self.content_start
    }

    /// Width of the reserved placeholder
    #[inline]
    pub fn class(&self) -> LengthClass {
        self.class
    }

    /// Close the frame whose content ends at `cursor`
    ///
    /// Returns the total object size including lead byte and placeholder.
    /// A cursor before the content start fails with `FrameMismatch`.
    #[inline]
    pub fn end(self, buf: &mut [u8], cursor: usize) -> Result<usize> {
        let mismatch = Error::FrameMismatch { offset: self.start };
        if self.start.checked_add(header_len(self.class)) != Some(self.content_start) {
            return Err(mismatch);
        }
        let content_len = cursor.checked_sub(self.content_start).ok_or(mismatch)?;
        write_object_end(buf, self.start, self.class, content_len)?;
        Ok(cursor - self.start)
    }
}
