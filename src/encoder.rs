//! Bounded cursor over a caller-supplied buffer
//!
//! [`Encoder`] tracks the current offset and delegates to the primitive
//! writers, so every `put_*` call is checked against the buffer capacity.

use crate::error::Result;
use crate::frame::ObjectFrame;
use crate::key::KeyBytes;
use crate::primitive;
use crate::tag::LengthClass;

/// Encoder that writes into a user-provided buffer
#[derive(Debug)]
pub struct Encoder<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Encoder<'a> {
    /// Create new encoder at the start of the buffer
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Create new encoder positioned at `offset`
    #[inline]
    pub fn at(buf: &'a mut [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    /// Write a boolean
    #[inline]
    pub fn put_bool(&mut self, value: bool) -> Result<()> {
        self.pos += primitive::write_boolean(self.buf, self.pos, value)?;
        Ok(())
    }

    /// Write a 64-bit integer
    #[inline]
    pub fn put_i64(&mut self, value: i64) -> Result<()> {
        self.pos += primitive::write_int64(self.buf, self.pos, value)?;
        Ok(())
    }

    /// Write a 32-bit float
    #[inline]
    pub fn put_f32(&mut self, value: f32) -> Result<()> {
        self.pos += primitive::write_float32(self.buf, self.pos, value)?;
        Ok(())
    }

    /// Write a 64-bit float
    #[inline]
    pub fn put_f64(&mut self, value: f64) -> Result<()> {
        self.pos += primitive::write_float64(self.buf, self.pos, value)?;
        Ok(())
    }

    /// Write a UTF-8 string
    #[inline]
    pub fn put_str(&mut self, value: &str) -> Result<()> {
        self.pos += primitive::write_utf8(self.buf, self.pos, value)?;
        Ok(())
    }

    /// Write a cached key
    #[inline]
    pub fn put_key(&mut self, key: &KeyBytes) -> Result<()> {
        self.put_direct(key.as_bytes())
    }

    /// Write raw bytes verbatim
    #[inline]
    pub fn put_direct(&mut self, raw: &[u8]) -> Result<()> {
        self.pos += primitive::write_direct(self.buf, self.pos, raw)?;
        Ok(())
    }

    /// Open an object at the current position
    #[inline]
    pub fn begin_object(&mut self, class: LengthClass) -> Result<ObjectFrame> {
        let frame = ObjectFrame::begin(self.buf, self.pos, class)?;
        self.pos = frame.content_start();
        Ok(frame)
    }

    /// Backpatch `frame` with everything written since it was opened
    ///
    /// Returns the total object size.
    #[inline]
    pub fn end_object(&mut self, frame: ObjectFrame) -> Result<usize> {
        frame.end(self.buf, self.pos)
    }

    /// Get current position in buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get remaining buffer capacity
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Get the bytes written so far
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.pos.min(self.buf.len())]
    }
}
