//! Byte storage behind `ArrayBuffer` objects
//!
//! ArrayBuffer is the byte store behind typed arrays and data views. It can be
//! detached, after which every read fails and its length reads as zero.

use parking_lot::RwLock;

/// ArrayBuffer slot
#[derive(Debug)]
pub struct JsArrayBuffer {
    /// `None` once detached
    data: RwLock<Option<Vec<u8>>>,
}

impl JsArrayBuffer {
    /// Create a zero-filled buffer of `byte_length` bytes
    pub fn new(byte_length: usize) -> Self {
        Self::from_bytes(vec![0; byte_length])
    }

    /// Create a buffer that owns `bytes`
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(bytes)),
        }
    }

    /// Storage has been released
    pub fn is_detached(&self) -> bool {
        self.data.read().is_none()
    }

    /// Release the storage; every view over it reads as detached
    pub fn detach(&self) {
        *self.data.write() = None;
    }

    /// Length in bytes, 0 once detached
    pub fn byte_length(&self) -> usize {
        self.data.read().as_ref().map_or(0, Vec::len)
    }

    /// Copy of the full contents (None if detached)
    pub fn to_vec(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Byte at `index`
    pub fn get(&self, index: usize) -> Option<u8> {
        self.data.read().as_ref()?.get(index).copied()
    }

    /// Store one byte; false when out of range or detached
    pub fn set(&self, index: usize, value: u8) -> bool {
        if let Some(data) = self.data.write().as_mut()
            && let Some(cell) = data.get_mut(index)
        {
            *cell = value;
            return true;
        }
        false
    }

    /// Fill `dest` from `offset`
    pub fn read_bytes(&self, offset: usize, dest: &mut [u8]) -> bool {
        let guard = self.data.read();
        if let Some(data) = guard.as_ref()
            && let Some(src) = data.get(offset..offset + dest.len())
        {
            dest.copy_from_slice(src);
            return true;
        }
        false
    }

    /// Copy `src` in at `offset`
    pub fn write_bytes(&self, offset: usize, src: &[u8]) -> bool {
        let mut guard = self.data.write();
        if let Some(data) = guard.as_mut()
            && let Some(dest) = data.get_mut(offset..offset + src.len())
        {
            dest.copy_from_slice(src);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let buf = JsArrayBuffer::new(4);
        assert!(buf.write_bytes(1, &[7, 8]));
        let mut out = [0u8; 3];
        assert!(buf.read_bytes(1, &mut out));
        assert_eq!(out, [7, 8, 0]);
        assert!(!buf.write_bytes(3, &[1, 2]));
    }

    #[test]
    fn test_detach() {
        let buf = JsArrayBuffer::from_bytes(vec![1, 2, 3]);
        buf.detach();
        assert!(buf.is_detached());
        assert_eq!(buf.byte_length(), 0);
        assert_eq!(buf.get(0), None);
        assert_eq!(buf.to_vec(), None);
    }
}
