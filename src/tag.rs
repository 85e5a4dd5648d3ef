//! Lead bytes and length size classes
//!
//! Every encoded element starts with a lead byte whose high nibble is the
//! type code and whose low nibble is a small parameter: a boolean value, a
//! payload width, the width of a length field, or an inlined key length.
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! +---------------+---------------+
//! |   type code   |   parameter   |
//! +---------------+---------------+
//! ```

use crate::error::{Error, Result};

/// Type codes stored in the high nibble of a lead byte
pub mod type_code {
    /// Tiny value, the parameter nibble is the value itself
    pub const TINY: u8 = 0x1;
    /// Fixed-width 64-bit signed integer
    pub const INT64: u8 = 0x2;
    /// IEEE-754 float, the parameter nibble is the payload width
    pub const FLOAT: u8 = 0x4;
    /// UTF-8 string, the parameter nibble is the length field width
    pub const UTF8: u8 = 0x5;
    /// Object, the parameter nibble is the length placeholder width
    pub const OBJECT: u8 = 0xA;
    /// Extended key, the parameter nibble is the length field width
    pub const KEY: u8 = 0xD;
    /// Compact key, the parameter nibble is the name length
    pub const KEY_SHORT: u8 = 0xE;
}

/// Lead byte for `true`
pub const TRUE: u8 = type_code::TINY << 4 | 0x1;

/// Lead byte for `false`
pub const FALSE: u8 = type_code::TINY << 4 | 0x2;

/// Lead byte for a 64-bit integer
pub const INT64: u8 = type_code::INT64 << 4 | 8;

/// Lead byte for a 32-bit float
pub const FLOAT32: u8 = type_code::FLOAT << 4 | 4;

/// Lead byte for a 64-bit float
pub const FLOAT64: u8 = type_code::FLOAT << 4 | 8;

/// Lead byte for an extended key (one explicit length byte)
pub const KEY_EXTENDED: u8 = type_code::KEY << 4 | 1;

/// Longest field name that fits the compact key form
pub const COMPACT_KEY_MAX: usize = 7;

/// Longest field name that fits the extended key form
pub const EXTENDED_KEY_MAX: usize = u8::MAX as usize;

/// Build a lead byte from a type code and parameter nibble
#[inline]
pub const fn lead(code: u8, param: u8) -> u8 {
    code << 4 | (param & 0x0F)
}

/// Width of a length field
///
/// Lengths are written big-endian in exactly `width()` bytes. The class is
/// fixed before the content it measures is written and never shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LengthClass {
    /// 1-byte length (up to 255)
    U8 = 1,
    /// 2-byte length (up to 65 535)
    U16 = 2,
    /// 4-byte length (up to 4 294 967 295)
    U32 = 4,
}

impl LengthClass {
    /// Size in bytes
    #[inline]
    pub const fn width(self) -> usize {
        self as usize
    }

    /// Largest length this class can hold
    #[inline]
    pub const fn max_len(self) -> usize {
        match self {
            LengthClass::U8 => u8::MAX as usize,
            LengthClass::U16 => u16::MAX as usize,
            LengthClass::U32 => u32::MAX as usize,
        }
    }

    /// Smallest class able to hold `len`
    #[inline]
    pub fn for_len(len: usize) -> Result<Self> {
        [LengthClass::U8, LengthClass::U16, LengthClass::U32]
            .into_iter()
            .find(|class| len <= class.max_len())
            .ok_or(Error::LengthClassOverflow {
                length: len,
                max: LengthClass::U32.max_len(),
            })
    }

    /// Check that `len` fits this class
    #[inline]
    pub fn check(self, len: usize) -> Result<()> {
        if len > self.max_len() {
            return Err(Error::LengthClassOverflow {
                length: len,
                max: self.max_len(),
            });
        }
        Ok(())
    }

    /// Write `len` big-endian into the first `width()` bytes of `dst`
    ///
    /// The caller has already checked both the class range and the slice
    /// length.
    #[inline]
    pub(crate) fn put(self, len: usize, dst: &mut [u8]) {
        let bytes = (len as u64).to_be_bytes();
        dst[..self.width()].copy_from_slice(&bytes[8 - self.width()..]);
    }
}

impl TryFrom<u8> for LengthClass {
    type Error = Error;

    fn try_from(width: u8) -> Result<Self> {
        match width {
            1 => Ok(LengthClass::U8),
            2 => Ok(LengthClass::U16),
            4 => Ok(LengthClass::U32),
            other => Err(Error::InvalidLengthClass(other)),
        }
    }
}
