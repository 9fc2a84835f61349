//! Unified Register File.
//!
//! This module provides the `RegisterFile` struct, a single interface over the integer and
//! floating-point register files. It provides:
//! 1. **Unified Storage:** Combined storage for all architectural registers mirrored by the DSU.
//! 2. **Abstraction:** One set of methods for reading and writing register values.
//! 3. **Observability:** A formatted dump used by the console and on fatal exits.

use crate::core::arch::fpr::Fpr;
use crate::core::arch::gpr::Gpr;

/// Unified register file containing both general-purpose and floating-point registers.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    gpr: Gpr,
    fpr: Fpr,
}

impl RegisterFile {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register. Register `x0` always returns 0.
    pub fn read(&self, idx: usize) -> u64 {
        self.gpr.read(idx)
    }

    /// Writes a general-purpose register. Writes to `x0` are ignored.
    pub fn write(&mut self, idx: usize, val: u64) {
        self.gpr.write(idx, val);
    }

    /// Reads the raw bits of a floating-point register.
    pub fn read_f(&self, idx: usize) -> u64 {
        self.fpr.read(idx)
    }

    /// Writes the raw bits of a floating-point register.
    pub fn write_f(&mut self, idx: usize, val: u64) {
        self.fpr.write(idx, val);
    }

    /// Clears every register to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Formats all general-purpose registers, two per line.
    ///
    /// # Returns
    ///
    /// Sixteen lines of the form `x0 =0x... x1 =0x...`.
    pub fn dump(&self) -> String {
        self.gpr.dump()
    }
}
