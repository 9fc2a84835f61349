//! RISC-V Floating-Point Register File.
//!
//! The core does not model an FPU; the floating-point file is a raw 64-bit mirror that
//! the debug port and the abstract-command interface can read and write. Values are kept
//! as raw bits so NaN payloads survive a write/read round trip unchanged.

use crate::common::constants::FPR_COUNT;

/// Floating-Point Register file (raw bit storage).
#[derive(Debug, Clone, Default)]
pub struct Fpr {
    fregs: [u64; FPR_COUNT],
}

impl Fpr {
    /// Creates a new floating-point register file with all registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the raw bits of register `idx`; out-of-range indices read as zero.
    pub fn read(&self, idx: usize) -> u64 {
        self.fregs.get(idx).copied().unwrap_or(0)
    }

    /// Writes the raw bits of register `idx`; out-of-range indices are ignored.
    pub fn write(&mut self, idx: usize, val: u64) {
        if let Some(slot) = self.fregs.get_mut(idx) {
            *slot = val;
        }
    }
}
