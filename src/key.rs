//! Field key encoding
//!
//! A key is the wire form of a field name, written immediately before the
//! field's value inside an object.
//!
//! ```text
//! compact  (name <= 7 bytes):  [0xE0 | len] [name bytes]
//! extended (name <= 255 bytes): [0xD1] [len] [name bytes]
//! ```

use alloc::sync::Arc;
use core::fmt;

use crate::error::{Error, Result};
use crate::primitive::reserve;
use crate::tag::{self, type_code, COMPACT_KEY_MAX, EXTENDED_KEY_MAX};

/// Pre-encoded key bytes, shared by every write of a field
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyBytes(Arc<[u8]>);

impl KeyBytes {
    /// The complete encoded key
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded length in bytes
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key uses the compact form
    #[inline]
    pub fn is_compact(&self) -> bool {
        self.0[0] >> 4 == type_code::KEY_SHORT
    }
}

impl AsRef<[u8]> for KeyBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyBytes(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Encoded length of the key for `name`, without checking its limit
#[inline]
fn key_len(name: &str) -> usize {
    if name.len() <= COMPACT_KEY_MAX {
        1 + name.len()
    } else {
        2 + name.len()
    }
}

/// Encode the key for `name` into `dst`, which is exactly `key_len(name)` long
#[inline]
fn put_key(name: &str, dst: &mut [u8]) {
    let bytes = name.as_bytes();
    if bytes.len() <= COMPACT_KEY_MAX {
        dst[0] = tag::lead(type_code::KEY_SHORT, bytes.len() as u8);
        dst[1..].copy_from_slice(bytes);
    } else {
        dst[0] = tag::KEY_EXTENDED;
        dst[1] = bytes.len() as u8;
        dst[2..].copy_from_slice(bytes);
    }
}

#[inline]
fn check_name(name: &str) -> Result<()> {
    if name.len() > EXTENDED_KEY_MAX {
        return Err(Error::LengthClassOverflow {
            length: name.len(),
            max: EXTENDED_KEY_MAX,
        });
    }
    Ok(())
}

/// Encode the key for a field name
///
/// Deterministic: the same name always yields the same bytes.
pub fn encode_key(name: &str) -> Result<KeyBytes> {
    check_name(name)?;
    let mut bytes = alloc::vec![0u8; key_len(name)];
    put_key(name, &mut bytes);
    Ok(KeyBytes(bytes.into()))
}

/// Encode a key straight into `buf` without caching it
#[inline]
pub fn write_key(buf: &mut [u8], offset: usize, name: &str) -> Result<usize> {
    check_name(name)?;
    let len = key_len(name);
    put_key(name, reserve(buf, offset, len)?);
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_compact_key() {
        let key = encode_key("field0").unwrap();
        assert_eq!(key.as_bytes(), hex!("e6 6669656c6430"));
        assert!(key.is_compact());
        assert_eq!(key.len(), 7);

        let key = encode_key("abcdefg").unwrap();
        assert_eq!(key.as_bytes()[0], 0xE7);
        assert!(key.is_compact());
    }

    #[test]
    fn test_extended_key() {
        let key = encode_key("fieldxx5").unwrap();
        assert_eq!(key.as_bytes(), hex!("d1 08 6669656c64787835"));
        assert!(!key.is_compact());

        let compact = encode_key("field5").unwrap();
        assert_ne!(key.as_bytes()[0] >> 4, compact.as_bytes()[0] >> 4);
    }

    #[test]
    fn test_empty_key() {
        let key = encode_key("").unwrap();
        assert_eq!(key.as_bytes(), [0xE0]);
    }

    #[test]
    fn test_key_limits() {
        let longest = "k".repeat(255);
        let key = encode_key(&longest).unwrap();
        assert_eq!(key.len(), 257);
        assert_eq!(key.as_bytes()[1], 255);

        let too_long = "k".repeat(256);
        assert_eq!(
            encode_key(&too_long),
            Err(Error::LengthClassOverflow {
                length: 256,
                max: 255
            })
        );
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(encode_key("fieldxx9"), encode_key("fieldxx9"));
        assert_eq!(encode_key("id"), encode_key("id"));
    }

    #[test]
    fn test_write_key_matches_encode_key() {
        let mut buf = [0u8; 32];
        for name in ["a", "field4", "fieldxx7", "a_much_longer_field_name"] {
            let n = write_key(&mut buf, 3, name).unwrap();
            assert_eq!(&buf[3..3 + n], encode_key(name).unwrap().as_bytes());
        }

        assert_eq!(
            write_key(&mut buf, 30, "field0"),
            Err(Error::BufferOverflow {
                offset: 30,
                needed: 7,
                capacity: 32
            })
        );
    }

    #[test]
    fn test_key_debug() {
        let key = encode_key("id").unwrap();
        assert_eq!(alloc::format!("{key:?}"), "KeyBytes(e26964)");
    }
}
