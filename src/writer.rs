//! Metadata-driven object writer
//!
//! [`ObjectWriter`] holds the shared [`TypeMetadata`] of one record type and
//! writes instances in a single pass: object header, then for every field
//! its cached key followed by its value, then the length backpatch.

use alloc::sync::Arc;

use crate::encoder::Encoder;
use crate::error::Result;
use crate::schema::{Record, TypeMetadata};
use crate::tag::LengthClass;

/// Writes instances of `T` as objects
pub struct ObjectWriter<T> {
    metadata: Arc<TypeMetadata<T>>,
}

impl<T: Record> ObjectWriter<T> {
    /// Create a writer for `T`
    ///
    /// With the `std` feature the metadata comes from the process-wide
    /// registry and is built at most once per type. Without it every writer
    /// builds its own copy.
    pub fn new() -> Result<Self> {
        #[cfg(feature = "std")]
        let metadata = crate::registry::metadata::<T>()?;
        #[cfg(not(feature = "std"))]
        let metadata = Arc::new(TypeMetadata::<T>::build()?);

        Ok(Self { metadata })
    }

    /// Create a writer from already built metadata
    pub fn from_metadata(metadata: Arc<TypeMetadata<T>>) -> Self {
        Self { metadata }
    }

    /// Write `instance` into `buf` at `offset`
    ///
    /// `class` is the width of every object length placeholder, nested
    /// objects included. Returns the total number of bytes written. On error
    /// the bytes after `offset` are unspecified and the outer length
    /// placeholder is left unpatched.
    #[inline]
    pub fn write_object(
        &self,
        instance: &T,
        class: LengthClass,
        buf: &mut [u8],
        offset: usize,
    ) -> Result<usize> {
        let mut encoder = Encoder::at(buf, offset);
        self.write_to(instance, class, &mut encoder)
    }

    /// Write `instance` at the encoder's current position
    #[inline]
    pub fn write_to(
        &self,
        instance: &T,
        class: LengthClass,
        encoder: &mut Encoder<'_>,
    ) -> Result<usize> {
        let start = encoder.position();
        self.metadata.write(instance, encoder, class)?;
        Ok(encoder.position() - start)
    }

    /// Exact number of bytes [`ObjectWriter::write_object`] would write
    #[inline]
    pub fn encoded_len(&self, instance: &T, class: LengthClass) -> usize {
        self.metadata.encoded_len(instance, class)
    }

    /// The shared metadata
    #[inline]
    pub fn metadata(&self) -> &Arc<TypeMetadata<T>> {
        &self.metadata
    }
}

impl<T> Clone for ObjectWriter<T> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
        }
    }
}

impl<T> core::fmt::Debug for ObjectWriter<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectWriter")
            .field("type_name", &self.metadata.type_name())
            .field("fields", &self.metadata.fields().len())
            .finish()
    }
}

/// Write `instance` using the registry's metadata for `T`
#[cfg(feature = "std")]
pub fn write_object<T: Record>(
    instance: &T,
    class: LengthClass,
    buf: &mut [u8],
    offset: usize,
) -> Result<usize> {
    ObjectWriter::<T>::new()?.write_object(instance, class, buf, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::Schema;
    use alloc::string::String;
    use hex_literal::hex;

    struct Pair {
        name: String,
        score: f64,
    }

    impl Record for Pair {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema.field("name", |p| &p.name).field("score", |p| &p.score);
        }
    }

    fn pair() -> Pair {
        Pair {
            name: String::from("ab"),
            score: 1.0,
        }
    }

    #[test]
    fn test_write_object_at_offset() {
        let writer = ObjectWriter::<Pair>::new().unwrap();
        let mut buf = [0u8; 32];

        let size = writer
            .write_object(&pair(), LengthClass::U8, &mut buf, 4)
            .unwrap();
        assert_eq!(size, 26);
        assert_eq!(size, writer.encoded_len(&pair(), LengthClass::U8));
        assert_eq!(buf[..4], [0u8; 4]);
        assert_eq!(
            buf[4..4 + size],
            hex!("a1 18 e4 6e616d65 51 02 6162 e5 73636f7265 48 3ff0000000000000")
        );
    }

    #[test]
    fn test_write_object_is_deterministic() {
        let writer = ObjectWriter::<Pair>::new().unwrap();
        let mut first = [0u8; 64];
        let mut second = [0xFFu8; 64];

        let a = writer
            .write_object(&pair(), LengthClass::U16, &mut first, 0)
            .unwrap();
        let b = writer
            .write_object(&pair(), LengthClass::U16, &mut second, 0)
            .unwrap();
        assert_eq!(first[..a], second[..b]);
    }

    #[test]
    fn test_write_object_buffer_overflow() {
        let writer = ObjectWriter::<Pair>::new().unwrap();
        let mut buf = [0u8; 16];

        let err = writer
            .write_object(&pair(), LengthClass::U8, &mut buf, 0)
            .unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { capacity: 16, .. }));
        // Length placeholder was never committed
        assert_eq!(buf[..2], hex!("a1 00"));
    }

    #[test]
    fn test_write_object_length_class_overflow() {
        let writer = ObjectWriter::<Pair>::new().unwrap();
        let long = Pair {
            name: "n".repeat(300),
            score: 0.0,
        };
        let mut buf = [0u8; 512];

        assert!(matches!(
            writer.write_object(&long, LengthClass::U8, &mut buf, 0),
            Err(Error::LengthClassOverflow { max: 255, .. })
        ));
        assert_eq!(buf[1], 0);

        let size = writer
            .write_object(&long, LengthClass::U16, &mut buf, 0)
            .unwrap();
        assert_eq!(size, writer.encoded_len(&long, LengthClass::U16));
        assert_eq!(
            u16::from_be_bytes([buf[1], buf[2]]) as usize,
            size - 3
        );
    }

    #[cfg(not(feature = "std"))]
    #[test]
    fn test_writers_without_registry_build_private_metadata() {
        let first = ObjectWriter::<Pair>::new().unwrap();
        let second = ObjectWriter::<Pair>::new().unwrap();
        assert!(!Arc::ptr_eq(first.metadata(), second.metadata()));

        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        let size = first
            .write_object(&pair(), LengthClass::U8, &mut a, 0)
            .unwrap();
        second
            .write_object(&pair(), LengthClass::U8, &mut b, 0)
            .unwrap();
        assert_eq!(a[..size], b[..size]);
    }

    #[test]
    fn test_writer_clone_shares_metadata() {
        let writer = ObjectWriter::<Pair>::new().unwrap();
        let clone = writer.clone();
        assert!(Arc::ptr_eq(writer.metadata(), clone.metadata()));

        let debug = alloc::format!("{writer:?}");
        assert!(debug.contains("fields: 2"));
    }
}
