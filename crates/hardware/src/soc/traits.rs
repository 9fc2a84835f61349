//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by all bus-attached components. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** Byte, half, word, and doubleword read/write at device-relative offsets.
//! 3. **Downcasting:** Optional casts to `Uart` for console output and to `Clint` for the timer.

use crate::soc::devices::{Clint, Uart};

/// Trait for memory-mapped devices attached to the system bus.
pub trait Device: Send {
    /// Returns a short name for this device (e.g., `"UART0"`, `"RAM"`).
    fn name(&self) -> &str;
    /// Returns (base_address, size_in_bytes) for this device's region.
    fn address_range(&self) -> (u64, u64);
    /// Reads one byte at the given device-relative offset.
    fn read_u8(&mut self, offset: u64) -> u8;
    /// Reads two bytes (little-endian) at the given offset.
    fn read_u16(&mut self, offset: u64) -> u16 {
        u16::from_le_bytes([self.read_u8(offset), self.read_u8(offset + 1)])
    }
    /// Reads four bytes (little-endian) at the given offset.
    fn read_u32(&mut self, offset: u64) -> u32 {
        u32::from(self.read_u16(offset)) | (u32::from(self.read_u16(offset + 2)) << 16)
    }
    /// Reads eight bytes (little-endian) at the given offset.
    fn read_u64(&mut self, offset: u64) -> u64 {
        u64::from(self.read_u32(offset)) | (u64::from(self.read_u32(offset + 4)) << 32)
    }
    /// Writes one byte at the given offset.
    fn write_u8(&mut self, offset: u64, val: u8);
    /// Writes two bytes (little-endian) at the given offset.
    fn write_u16(&mut self, offset: u64, val: u16) {
        for (i, b) in val.to_le_bytes().into_iter().enumerate() {
            self.write_u8(offset + i as u64, b);
        }
    }
    /// Writes four bytes (little-endian) at the given offset.
    fn write_u32(&mut self, offset: u64, val: u32) {
        for (i, b) in val.to_le_bytes().into_iter().enumerate() {
            self.write_u8(offset + i as u64, b);
        }
    }
    /// Writes eight bytes (little-endian) at the given offset.
    fn write_u64(&mut self, offset: u64, val: u64) {
        for (i, b) in val.to_le_bytes().into_iter().enumerate() {
            self.write_u8(offset + i as u64, b);
        }
    }

    /// Writes a contiguous byte slice at the given offset (default: byte-by-byte).
    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(offset + i as u64, *byte);
        }
    }

    /// Returns a mutable reference as `Uart` if this device is a UART; otherwise `None`.
    fn as_uart_mut(&mut self) -> Option<&mut Uart> {
        None
    }

    /// Returns a mutable reference as `Clint` if this device is a CLINT; otherwise `None`.
    fn as_clint_mut(&mut self) -> Option<&mut Clint> {
        None
    }
}
