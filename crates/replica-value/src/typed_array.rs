//! Typed array views over an `ArrayBuffer` object
//!
//! TypedArrays are views over an ArrayBuffer object, providing typed access to
//! binary data. All 11 element types share one implementation via
//! `TypedArrayKind`. Elements are little-endian.

use crate::array_buffer::JsArrayBuffer;
use crate::error::{ValueError, ValueResult};
use crate::object::ObjectRef;

/// Element type of a typed array view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    /// `Int8Array`
    Int8,
    /// `Uint8Array`
    Uint8,
    /// `Uint8ClampedArray`, stores saturate to 0..=255
    Uint8Clamped,
    /// `Int16Array`
    Int16,
    /// `Uint16Array`
    Uint16,
    /// `Int32Array`
    Int32,
    /// `Uint32Array`
    Uint32,
    /// `Float32Array`
    Float32,
    /// `Float64Array`
    Float64,
    /// `BigInt64Array`
    BigInt64,
    /// `BigUint64Array`
    BigUint64,
}

impl TypedArrayKind {
    /// Every kind, in constructor-name order
    pub const ALL: [TypedArrayKind; 11] = [
        TypedArrayKind::Int8,
        TypedArrayKind::Uint8,
        TypedArrayKind::Uint8Clamped,
        TypedArrayKind::Int16,
        TypedArrayKind::Uint16,
        TypedArrayKind::Int32,
        TypedArrayKind::Uint32,
        TypedArrayKind::Float32,
        TypedArrayKind::Float64,
        TypedArrayKind::BigInt64,
        TypedArrayKind::BigUint64,
    ];

    /// Bytes per element
    pub fn element_size(&self) -> usize {
        match self {
            TypedArrayKind::Int8 | TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => 1,
            TypedArrayKind::Int16 | TypedArrayKind::Uint16 => 2,
            TypedArrayKind::Int32 | TypedArrayKind::Uint32 | TypedArrayKind::Float32 => 4,
            TypedArrayKind::Float64 | TypedArrayKind::BigInt64 | TypedArrayKind::BigUint64 => 8,
        }
    }

    /// Constructor name
    pub fn name(&self) -> &'static str {
        match self {
            TypedArrayKind::Int8 => "Int8Array",
            TypedArrayKind::Uint8 => "Uint8Array",
            TypedArrayKind::Uint8Clamped => "Uint8ClampedArray",
            TypedArrayKind::Int16 => "Int16Array",
            TypedArrayKind::Uint16 => "Uint16Array",
            TypedArrayKind::Int32 => "Int32Array",
            TypedArrayKind::Uint32 => "Uint32Array",
            TypedArrayKind::Float32 => "Float32Array",
            TypedArrayKind::Float64 => "Float64Array",
            TypedArrayKind::BigInt64 => "BigInt64Array",
            TypedArrayKind::BigUint64 => "BigUint64Array",
        }
    }

    /// Parse a constructor name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Elements are BigInts
    pub fn is_bigint(&self) -> bool {
        matches!(self, TypedArrayKind::BigInt64 | TypedArrayKind::BigUint64)
    }

    fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            TypedArrayKind::Int8 => f64::from(bytes[0] as i8),
            TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => f64::from(bytes[0]),
            TypedArrayKind::Int16 => f64::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            TypedArrayKind::Uint16 => f64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            TypedArrayKind::Int32 => f64::from(i32::from_le_bytes(word(bytes))),
            TypedArrayKind::Uint32 => f64::from(u32::from_le_bytes(word(bytes))),
            TypedArrayKind::Float32 => f64::from(f32::from_le_bytes(word(bytes))),
            TypedArrayKind::Float64 => f64::from_le_bytes(dword(bytes)),
            TypedArrayKind::BigInt64 => i64::from_le_bytes(dword(bytes)) as f64,
            TypedArrayKind::BigUint64 => u64::from_le_bytes(dword(bytes)) as f64,
        }
    }

    fn encode(&self, value: f64, out: &mut [u8]) {
        match self {
            TypedArrayKind::Int8 => out[0] = (value as i64 as i8) as u8,
            TypedArrayKind::Uint8 => out[0] = value as i64 as u8,
            TypedArrayKind::Uint8Clamped => out[0] = value.round().clamp(0.0, 255.0) as u8,
            TypedArrayKind::Int16 => out.copy_from_slice(&(value as i64 as i16).to_le_bytes()),
            TypedArrayKind::Uint16 => out.copy_from_slice(&(value as i64 as u16).to_le_bytes()),
            TypedArrayKind::Int32 => out.copy_from_slice(&(value as i64 as i32).to_le_bytes()),
            TypedArrayKind::Uint32 => out.copy_from_slice(&(value as i64 as u32).to_le_bytes()),
            TypedArrayKind::Float32 => out.copy_from_slice(&(value as f32).to_le_bytes()),
            TypedArrayKind::Float64 => out.copy_from_slice(&value.to_le_bytes()),
            TypedArrayKind::BigInt64 => out.copy_from_slice(&(value as i64).to_le_bytes()),
            TypedArrayKind::BigUint64 => out.copy_from_slice(&(value as u64).to_le_bytes()),
        }
    }
}

fn word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn dword(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[..8]);
    out
}

/// Typed array slot
///
/// A view over an ArrayBuffer object. It does not copy data - element reads
/// and writes go straight to the buffer.
#[derive(Debug)]
pub struct JsTypedArray {
    /// The underlying ArrayBuffer object
    buffer: ObjectRef,
    /// Start of the view within the buffer
    byte_offset: usize,
    /// Element count
    length: usize,
    /// Element type
    kind: TypedArrayKind,
}

impl JsTypedArray {
    /// Create a new TypedArray view over an ArrayBuffer object
    pub fn new(
        buffer: ObjectRef,
        kind: TypedArrayKind,
        byte_offset: usize,
        length: usize,
    ) -> ValueResult<Self> {
        let byte_length = buffer
            .as_array_buffer()
            .ok_or(ValueError::NotABuffer("TypedArray"))?
            .byte_length();
        let elem_size = kind.element_size();

        if byte_offset % elem_size != 0 {
            return Err(ValueError::range(
                "byte offset must be aligned to element size",
            ));
        }

        let view_length = length
            .checked_mul(elem_size)
            .ok_or_else(|| ValueError::range("TypedArray length overflow"))?;
        if byte_offset + view_length > byte_length {
            return Err(ValueError::range(
                "TypedArray would extend past end of buffer",
            ));
        }

        Ok(Self {
            buffer,
            byte_offset,
            length,
            kind,
        })
    }

    /// Element type
    pub fn kind(&self) -> TypedArrayKind {
        self.kind
    }

    /// Get the underlying ArrayBuffer object
    pub fn buffer(&self) -> &ObjectRef {
        &self.buffer
    }

    fn store(&self) -> Option<&JsArrayBuffer> {
        self.buffer.as_array_buffer()
    }

    /// Start of the view within the buffer
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Bytes covered by the view
    pub fn byte_length(&self) -> usize {
        self.length() * self.kind.element_size()
    }

    /// Get the number of elements (0 once the buffer is detached)
    pub fn length(&self) -> usize {
        if self.is_detached() { 0 } else { self.length }
    }

    /// The backing buffer has been detached
    pub fn is_detached(&self) -> bool {
        self.store().is_none_or(JsArrayBuffer::is_detached)
    }

    /// Get an element as f64 (BigInt kinds are converted lossily)
    pub fn get(&self, index: usize) -> Option<f64> {
        if index >= self.length() {
            return None;
        }
        let size = self.kind.element_size();
        let mut bytes = [0u8; 8];
        if !self
            .store()?
            .read_bytes(self.byte_offset + index * size, &mut bytes[..size])
        {
            return None;
        }
        Some(self.kind.decode(&bytes[..size]))
    }

    /// Set an element from f64
    pub fn set(&self, index: usize, value: f64) -> bool {
        if index >= self.length() {
            return false;
        }
        let size = self.kind.element_size();
        let mut bytes = [0u8; 8];
        self.kind.encode(value, &mut bytes[..size]);
        self.store()
            .is_some_and(|s| s.write_bytes(self.byte_offset + index * size, &bytes[..size]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::JsObject;

    #[test]
    fn test_element_round_trip() {
        let buffer = JsObject::array_buffer(vec![0; 16]);
        for kind in TypedArrayKind::ALL {
            let ta = JsTypedArray::new(buffer.clone(), kind, 0, 1).unwrap();
            assert!(ta.set(0, 7.0), "{}", kind.name());
            assert_eq!(ta.get(0), Some(7.0), "{}", kind.name());
        }
    }

    #[test]
    fn test_misaligned_offset_rejected() {
        let buffer = JsObject::array_buffer(vec![0; 8]);
        let err = JsTypedArray::new(buffer, TypedArrayKind::Int32, 2, 1).unwrap_err();
        assert!(matches!(err, ValueError::Range(_)));
    }

    #[test]
    fn test_requires_buffer() {
        let err = JsTypedArray::new(JsObject::ordinary(None), TypedArrayKind::Uint8, 0, 0)
            .unwrap_err();
        assert_eq!(err, ValueError::NotABuffer("TypedArray"));
    }

    #[test]
    fn test_detached_view_reads_empty() {
        let buffer = JsObject::array_buffer(vec![1, 2]);
        let ta = JsTypedArray::new(buffer.clone(), TypedArrayKind::Uint8, 0, 2).unwrap();
        buffer.as_array_buffer().unwrap().detach();
        assert_eq!(ta.length(), 0);
        assert_eq!(ta.get(0), None);
    }
}
