//! Binary primitives for the transaction wire format.
//!
//! All integers are little-endian. Variable-length fields use one of three
//! framings:
//! - `LP`: `u16` length followed by exactly that many bytes
//! - `u16` frame: same shape, used for nested entities (Pointer in Relation)
//! - `u32` frame: `u32` length followed by the bytes of a nested entity
//!
//! **This layout is FROZEN.** Other implementations decode these bytes, and
//! transaction ids are hashes over them.

use bytes::{Buf, BufMut};

use crate::error::{CoreError, Result};

/// A growable output buffer.
///
/// Length prefixes are always derived from the slice being written, so a
/// declared length can never disagree with the number of bytes emitted.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    /// Append raw bytes with no framing.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write an element count as `u16`.
    pub fn put_count(&mut self, count: usize, what: &str) -> Result<()> {
        let count = u16::try_from(count).map_err(|_| {
            CoreError::InvariantViolation(format!("too many {what}: {count} > {}", u16::MAX))
        })?;
        self.put_u16(count);
        Ok(())
    }

    /// Write `u16 len || bytes`.
    pub fn put_length_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_count(bytes.len(), "bytes in length-prefixed field")?;
        self.put_raw(bytes);
        Ok(())
    }

    /// Write `u16 len || bytes` for a nested entity.
    pub fn put_frame_u16(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_length_prefixed(bytes)
    }

    /// Write `u32 len || bytes` for a nested entity.
    pub fn put_frame_u32(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| {
            CoreError::InvariantViolation(format!("frame of {} bytes exceeds u32", bytes.len()))
        })?;
        self.put_u32(len);
        self.put_raw(bytes);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A read cursor over a borrowed byte slice.
///
/// Every read checks the remaining length first and fails with
/// [`CoreError::UnexpectedEof`] instead of returning partial data.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(CoreError::UnexpectedEof {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Read exactly `len` raw bytes.
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read `u16 len || bytes`.
    pub fn get_length_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.get_u16()? as usize;
        self.get_bytes(len)
    }

    /// Read a `u16`-framed nested entity.
    pub fn get_frame_u16(&mut self) -> Result<&'a [u8]> {
        self.get_length_prefixed()
    }

    /// Read a `u32`-framed nested entity.
    pub fn get_frame_u32(&mut self) -> Result<&'a [u8]> {
        let len = self.get_u32()? as usize;
        self.get_bytes(len)
    }

    /// Read a `u16` presence flag (0 or 1).
    pub fn get_flag(&mut self, what: &str) -> Result<bool> {
        match self.get_u16()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CoreError::MalformedInput(format!(
                "{what} flag must be 0 or 1, got {other}"
            ))),
        }
    }

    /// Consume the reader, failing if any bytes are left over.
    pub fn finish(self, what: &str) -> Result<()> {
        if !self.buf.is_empty() {
            return Err(CoreError::MalformedInput(format!(
                "{} trailing bytes after {what}",
                self.buf.len()
            )));
        }
        Ok(())
    }
}
