//! Error types for the ionbuf writer

/// Errors that can occur while encoding values or building type metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A write would run past the end of the destination buffer
    #[error("buffer overflow: {needed} bytes needed at offset {offset}, capacity is {capacity}")]
    BufferOverflow {
        /// Offset the write started at
        offset: usize,
        /// Bytes the write needed
        needed: usize,
        /// Total capacity of the buffer
        capacity: usize,
    },
    /// A record field has a type with no primitive encoder
    #[error("field `{field}` has unsupported type `{type_name}`")]
    UnsupportedFieldType {
        /// Declared field name
        field: &'static str,
        /// Rust type name of the field
        type_name: &'static str,
    },
    /// A length does not fit the size class reserved for it
    #[error("length {length} exceeds the size class maximum of {max}")]
    LengthClassOverflow {
        /// Length that had to be stored
        length: usize,
        /// Largest length the size class can hold
        max: usize,
    },
    /// A record type reaches itself through nested object fields
    #[error("cyclic type graph through `{type_name}`")]
    CyclicTypeGraph {
        /// Type that was re-entered while its metadata was being built
        type_name: &'static str,
    },
    /// A record declares the same field name twice
    #[error("duplicate field `{field}`")]
    DuplicateField {
        /// Repeated field name
        field: &'static str,
    },
    /// A length class width other than 1, 2 or 4 bytes
    #[error("invalid length class width {0}")]
    InvalidLengthClass(u8),
    /// Backpatch target does not hold an object lead byte of the given class
    #[error("no object frame of the given length class at offset {offset}")]
    FrameMismatch {
        /// Offset the frame was expected at
        offset: usize,
    },
}

impl Error {
    /// Shorthand for a [`Error::BufferOverflow`] against `buf`
    #[inline]
    pub(crate) fn overflow(buf: &[u8], offset: usize, needed: usize) -> Self {
        Error::BufferOverflow {
            offset,
            needed,
            capacity: buf.len(),
        }
    }
}

/// Result type alias for ionbuf operations
pub type Result<T> = core::result::Result<T, Error>;
