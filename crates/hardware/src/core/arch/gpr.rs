//! RISC-V General-Purpose Register File.
//!
//! This module implements the integer register file. It performs the following:
//! 1. **Storage:** Maintains 32 integer registers (`x0`-`x31`).
//! 2. **Invariant Enforcement:** Ensures that register `x0` is hardwired to zero.
//! 3. **Debugging:** Provides a formatted dump of the complete register state.

use std::fmt::Write;

use crate::common::constants::GPR_COUNT;

/// General-Purpose Register file.
///
/// Register `x0` is hardwired to zero and cannot be modified. Out-of-range
/// indices read as zero and ignore writes, so a malformed debug-port index
/// never panics the core.
#[derive(Debug, Clone, Default)]
pub struct Gpr {
    regs: [u64; GPR_COUNT],
}

impl Gpr {
    /// Creates a new general-purpose register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register value.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    ///
    /// # Returns
    ///
    /// The 64-bit value stored in the register. Register `x0` always returns 0.
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 {
            0
        } else {
            self.regs.get(idx).copied().unwrap_or(0)
        }
    }

    /// Writes a value to a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    /// * `val` - The 64-bit value to write.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            if let Some(slot) = self.regs.get_mut(idx) {
                *slot = val;
            }
        }
    }

    /// Formats the registers in pairs with hexadecimal values.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..GPR_COUNT).step_by(2) {
            let _ = writeln!(
                out,
                "x{:<2}={:#018x} x{:<2}={:#018x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            );
        }
        out
    }
}
