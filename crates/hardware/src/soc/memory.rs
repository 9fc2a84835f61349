//! Main memory.
//!
//! A flat, byte-addressable RAM device backed by a `Vec<u8>`. Reads past the end of the
//! buffer return zero and writes past it are dropped; the bus never routes such accesses
//! here because it checks the device range first.

use crate::soc::traits::Device;

/// Flat RAM device.
#[derive(Debug, Clone)]
pub struct Memory {
    data: Vec<u8>,
    base: u64,
}

impl Memory {
    /// Creates a zero-filled RAM of `size` bytes mapped at `base`.
    pub fn new(base: u64, size: usize) -> Self {
        Self {
            data: vec![0; size],
            base,
        }
    }

    /// Returns the backing bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn slice_mut(&mut self, offset: u64, len: usize) -> Option<&mut [u8]> {
        let start = usize::try_from(offset).ok()?;
        self.data.get_mut(start..start.checked_add(len)?)
    }

    fn read_le<const N: usize>(&self, offset: u64) -> [u8; N] {
        let mut out = [0u8; N];
        if let Ok(start) = usize::try_from(offset) {
            if let Some(src) = self.data.get(start..start.saturating_add(N)) {
                out.copy_from_slice(src);
            }
        }
        out
    }
}

impl Device for Memory {
    fn name(&self) -> &str {
        "RAM"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.data.len() as u64)
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        self.read_le::<1>(offset)[0]
    }

    fn read_u16(&mut self, offset: u64) -> u16 {
        u16::from_le_bytes(self.read_le(offset))
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        u32::from_le_bytes(self.read_le(offset))
    }

    fn read_u64(&mut self, offset: u64) -> u64 {
        u64::from_le_bytes(self.read_le(offset))
    }

    fn write_u8(&mut self, offset: u64, val: u8) {
        self.write_bytes(offset, &[val]);
    }

    fn write_u16(&mut self, offset: u64, val: u16) {
        self.write_bytes(offset, &val.to_le_bytes());
    }

    fn write_u32(&mut self, offset: u64, val: u32) {
        self.write_bytes(offset, &val.to_le_bytes());
    }

    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_bytes(offset, &val.to_le_bytes());
    }

    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        if let Some(dst) = self.slice_mut(offset, data.len()) {
            dst.copy_from_slice(data);
        }
    }
}
