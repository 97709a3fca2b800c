//! Native-endian encode/decode of plugin state.
//!
//! Values are written back to back with no header or padding, so a blob is
//! only readable by the code that wrote it, in the same order.

use bytemuck::Pod;

use crate::types::{PluginError, Result};

/// Bounds-checked cursor over a caller-supplied output region
pub struct BufferWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufferWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn write<T: Pod>(&mut self, val: T) -> Result<()> {
        let bytes = bytemuck::bytes_of(&val);
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(PluginError::InvalidArgument(format!(
                "serialization buffer too small: need {end} bytes, have {}",
                self.buf.len()
            )));
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    /// Bytes written so far
    pub fn written(&self) -> usize {
        self.pos
    }
}

/// Cursor that reads `Pod` values in the order they were written
pub struct BufferReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn read<T: Pod>(&mut self) -> Result<T> {
        let end = self.pos + std::mem::size_of::<T>();
        if end > self.buf.len() {
            return Err(PluginError::Deserialization { expected: end, found: self.buf.len() });
        }
        let val = bytemuck::pod_read_unaligned(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(val)
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Every byte must have been consumed.
    pub fn finish(self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(PluginError::Deserialization { expected: self.pos, found: self.buf.len() });
        }
        Ok(())
    }
}
