use crate::viewport::Size;
use anyhow::{anyhow, Result};

// ==================== Decoding ====================
/// Decode `len` bytes starting at `ptr` out of a linear-memory snapshot.
///
/// Policy: UTF-8 with U+FFFD replacement, same as a default `TextDecoder`.
/// - valid UTF-8 comes back byte-for-byte, so `result.len() == len`
/// - malformed sequences turn into replacement characters, never an error
/// - a range running past the end of memory is clamped to what is there
pub fn decode(memory: &[u8], ptr: u32, len: u32) -> String {
    let bytes = clamp_range(memory.len(), ptr, len)
        .map(|range| &memory[range])
        .unwrap_or(&[]);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Clamp `[ptr, ptr + len)` against a buffer of `available` bytes
/// - `None` when `ptr` itself is already out of bounds
pub fn clamp_range(available: usize, ptr: u32, len: u32) -> Option<std::ops::Range<usize>> {
    let start = ptr as usize;
    if start > available {
        return None;
    }
    let end = start.saturating_add(len as usize).min(available);
    Some(start..end)
}

// ==================== Memory Access ====================
/// Anything that can hand out bytes of a module's linear memory.
///
/// NOTE: implementations must look the buffer up again on every call, a
/// `memory.grow` inside the module detaches the previous `ArrayBuffer`
pub trait MemoryAccess {
    /// Copy out `[ptr, ptr + len)`, clamped to the current buffer
    fn read(&self, ptr: u32, len: u32) -> Vec<u8>;

    /// Write `bytes` at `ptr`, failing when the range doesn't fit
    fn write(&self, ptr: u32, bytes: &[u8]) -> Result<()>;

    /// Current size of the memory buffer in bytes
    fn byte_length(&self) -> usize;
}

/// String and struct marshalling on top of a [`MemoryAccess`]
pub struct Marshaller<M> {
    memory: M,
}

impl<M: MemoryAccess> Marshaller<M> {
    pub fn new(memory: M) -> Self {
        Marshaller { memory }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn read_str(&self, ptr: u32, len: u32) -> String {
        let bytes = self.memory.read(ptr, len);
        decode(&bytes, 0, len)
    }

    /// Store `size` at `ptr` as two little-endian i32 (width, height)
    pub fn write_size(&self, ptr: u32, size: Size) -> Result<()> {
        let end = (ptr as u64).checked_add(SIZE_BYTES as u64);
        if end.map_or(true, |end| end > self.memory.byte_length() as u64) {
            return Err(anyhow!(
                "size write at {:#x} overruns memory of {} bytes",
                ptr,
                self.memory.byte_length()
            ));
        }
        self.memory.write(ptr, &size.to_le_bytes())
    }
}

/// Width + height, both i32
pub const SIZE_BYTES: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared byte vector standing in for `memory.buffer`
    /// - tests swap the whole vector to mimic a detached buffer after growth
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn replace(&self, bytes: Vec<u8>) {
            *self.0.borrow_mut() = bytes;
        }
    }

    impl MemoryAccess for SharedBuffer {
        fn read(&self, ptr: u32, len: u32) -> Vec<u8> {
            let buffer = self.0.borrow();
            clamp_range(buffer.len(), ptr, len)
                .map(|range| buffer[range].to_vec())
                .unwrap_or_default()
        }

        fn write(&self, ptr: u32, bytes: &[u8]) -> Result<()> {
            let mut buffer = self.0.borrow_mut();
            let start = ptr as usize;
            let end = start
                .checked_add(bytes.len())
                .ok_or_else(|| anyhow!("out of bounds"))?;
            buffer
                .get_mut(start..end)
                .ok_or_else(|| anyhow!("out of bounds"))?
                .copy_from_slice(bytes);
            Ok(())
        }

        fn byte_length(&self) -> usize {
            self.0.borrow().len()
        }
    }

    #[test]
    fn decode_returns_exactly_len_bytes_of_ascii() {
        let memory = b"xxhello worldyy";
        let text = decode(memory, 2, 11);
        assert_eq!(text, "hello world");
        assert_eq!(text.len(), 11);
    }

    #[test]
    fn decode_keeps_multibyte_utf8() {
        let mut memory = vec![0u8; 4];
        memory.extend_from_slice("héllo → ✓".as_bytes());
        let len = "héllo → ✓".len() as u32;
        let text = decode(&memory, 4, len);
        assert_eq!(text, "héllo → ✓");
        assert_eq!(text.len(), len as usize);
    }

    #[test]
    fn decode_replaces_malformed_bytes_instead_of_failing() {
        let memory = [b'o', b'k', 0xff, 0xfe, b'!'];
        assert_eq!(decode(&memory, 0, 5), "ok\u{fffd}\u{fffd}!");
    }

    #[test]
    fn decode_clamps_ranges_past_the_end() {
        let memory = b"abc";
        assert_eq!(decode(memory, 1, 100), "bc");
        assert_eq!(decode(memory, 3, 4), "");
        assert_eq!(decode(memory, 10, 4), "");
        assert_eq!(decode(memory, 0, 0), "");
    }

    #[test]
    fn marshaller_rereads_buffer_after_replacement() {
        let buffer = SharedBuffer::default();
        buffer.replace(b"first".to_vec());
        let marshaller = Marshaller::new(buffer.clone());
        assert_eq!(marshaller.read_str(0, 5), "first");

        // grown memory: old contents gone, new backing vector
        let mut grown = vec![0u8; 64];
        grown[32..38].copy_from_slice(b"second");
        buffer.replace(grown);
        assert_eq!(marshaller.read_str(32, 6), "second");
        assert_eq!(marshaller.read_str(0, 5), "\0\0\0\0\0");
    }

    #[test]
    fn write_size_stores_little_endian_pair() {
        let buffer = SharedBuffer::default();
        buffer.replace(vec![0u8; 16]);
        let marshaller = Marshaller::new(buffer.clone());
        marshaller
            .write_size(4, Size { width: 1024, height: 768 })
            .unwrap();
        let bytes = buffer.read(4, 8);
        assert_eq!(i32::from_le_bytes(bytes[0..4].try_into().unwrap()), 1024);
        assert_eq!(i32::from_le_bytes(bytes[4..8].try_into().unwrap()), 768);
    }

    #[test]
    fn write_size_rejects_out_of_bounds_pointer() {
        let buffer = SharedBuffer::default();
        buffer.replace(vec![0u8; 8]);
        let marshaller = Marshaller::new(buffer.clone());
        assert!(marshaller.write_size(4, Size { width: 1, height: 1 }).is_err());
        assert_eq!(buffer.read(0, 8), vec![0u8; 8]);
    }

    #[test]
    fn write_size_rejects_pointer_near_the_top_of_the_address_space() {
        let buffer = SharedBuffer::default();
        buffer.replace(vec![0u8; 16]);
        let marshaller = Marshaller::new(buffer.clone());
        // a module calling size(-1) hands over 0xffff_ffff
        assert!(marshaller.write_size(u32::MAX, Size { width: 1, height: 1 }).is_err());
        assert!(marshaller
            .write_size(u32::MAX - 3, Size { width: 1, height: 1 })
            .is_err());
        assert_eq!(buffer.read(0, 16), vec![0u8; 16]);
    }
}
