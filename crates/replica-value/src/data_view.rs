//! DataView implementation
//!
//! A DataView frames a byte range of an ArrayBuffer object for arbitrary,
//! byte-order-aware access.

use crate::array_buffer::JsArrayBuffer;
use crate::error::{ValueError, ValueResult};
use crate::object::ObjectRef;

/// DataView slot
#[derive(Debug)]
pub struct JsDataView {
    /// The underlying ArrayBuffer object
    buffer: ObjectRef,
    /// Byte offset into the buffer
    byte_offset: usize,
    /// Byte length of the view
    byte_length: usize,
}

impl JsDataView {
    /// Create a view; `byte_length` defaults to the rest of the buffer
    pub fn new(
        buffer: ObjectRef,
        byte_offset: usize,
        byte_length: Option<usize>,
    ) -> ValueResult<Self> {
        let store = buffer
            .as_array_buffer()
            .ok_or(ValueError::NotABuffer("DataView"))?;
        if store.is_detached() {
            return Err(ValueError::Detached);
        }
        let buffer_length = store.byte_length();
        if byte_offset > buffer_length {
            return Err(ValueError::range("Start offset is outside the bounds of the buffer"));
        }
        let byte_length = byte_length.unwrap_or(buffer_length - byte_offset);
        if byte_offset + byte_length > buffer_length {
            return Err(ValueError::range("Invalid DataView length"));
        }
        Ok(Self {
            buffer,
            byte_offset,
            byte_length,
        })
    }

    /// Get the underlying ArrayBuffer object
    pub fn buffer(&self) -> &ObjectRef {
        &self.buffer
    }

    /// Get the byte offset into the buffer
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Get the byte length (0 if detached)
    pub fn byte_length(&self) -> usize {
        if self.is_detached() { 0 } else { self.byte_length }
    }

    /// Check if the underlying buffer is detached
    pub fn is_detached(&self) -> bool {
        self.buffer
            .as_array_buffer()
            .is_none_or(JsArrayBuffer::is_detached)
    }

    fn read<const N: usize>(&self, byte_offset: usize) -> ValueResult<[u8; N]> {
        let store = self.buffer.as_array_buffer().ok_or(ValueError::Detached)?;
        if store.is_detached() {
            return Err(ValueError::Detached);
        }
        if byte_offset + N > self.byte_length {
            return Err(ValueError::range("Offset is outside the bounds of the DataView"));
        }
        let mut bytes = [0u8; N];
        store.read_bytes(self.byte_offset + byte_offset, &mut bytes);
        Ok(bytes)
    }

    fn write<const N: usize>(&self, byte_offset: usize, bytes: [u8; N]) -> ValueResult<()> {
        let store = self.buffer.as_array_buffer().ok_or(ValueError::Detached)?;
        if store.is_detached() {
            return Err(ValueError::Detached);
        }
        if byte_offset + N > self.byte_length {
            return Err(ValueError::range("Offset is outside the bounds of the DataView"));
        }
        store.write_bytes(self.byte_offset + byte_offset, &bytes);
        Ok(())
    }

    /// Get Uint8 at byte offset
    pub fn get_uint8(&self, byte_offset: usize) -> ValueResult<u8> {
        Ok(self.read::<1>(byte_offset)?[0])
    }

    /// Set Uint8 at byte offset
    pub fn set_uint8(&self, byte_offset: usize, value: u8) -> ValueResult<()> {
        self.write(byte_offset, [value])
    }

    /// Get Uint32 at byte offset
    pub fn get_uint32(&self, byte_offset: usize, little_endian: bool) -> ValueResult<u32> {
        let bytes = self.read::<4>(byte_offset)?;
        Ok(if little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    /// Set Uint32 at byte offset
    pub fn set_uint32(
        &self,
        byte_offset: usize,
        value: u32,
        little_endian: bool,
    ) -> ValueResult<()> {
        let bytes = if little_endian {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.write(byte_offset, bytes)
    }

    /// Get Float64 at byte offset
    pub fn get_float64(&self, byte_offset: usize, little_endian: bool) -> ValueResult<f64> {
        let bytes = self.read::<8>(byte_offset)?;
        Ok(if little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    /// Set Float64 at byte offset
    pub fn set_float64(
        &self,
        byte_offset: usize,
        value: f64,
        little_endian: bool,
    ) -> ValueResult<()> {
        let bytes = if little_endian {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.write(byte_offset, bytes)
    }
}
