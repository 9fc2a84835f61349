//! Breakpoint planting and removal.
//!
//! Software breakpoints overwrite the instruction at the target address with `ebreak`, or
//! `c.ebreak` when the displaced instruction is compressed. Hardware breakpoints only record
//! the address. All memory patching goes through the debug bus.

use super::Cpu;
use crate::common::BusError;
use crate::core::breakpoint::{BreakpointKind, BreakpointRecord};
use crate::isa::instruction::is_compressed;
use crate::isa::privileged::opcodes::{C_EBREAK, EBREAK};

impl Cpu {
    /// Plants a breakpoint of `kind` at `addr`.
    ///
    /// Planting over an existing breakpoint replaces it; the original bytes are kept.
    ///
    /// # Errors
    ///
    /// The `BusError` of the debug-bus read or write for software breakpoints.
    pub fn add_breakpoint(&mut self, addr: u64, kind: BreakpointKind) -> Result<(), BusError> {
        if let Some(old) = self.breakpoints.get(addr).copied() {
            if old.kind == kind {
                tracing::warn!(addr = format_args!("{addr:#x}"), "breakpoint already set");
                return Ok(());
            }
            self.remove_breakpoint(addr)?;
        }

        let record = match kind {
            BreakpointKind::Software => {
                let original = self.read_original(addr)?;
                let (injected, len) = if is_compressed(original) {
                    (u32::from(C_EBREAK), 2)
                } else {
                    (EBREAK, 4)
                };
                self.debug_write(addr, len, u64::from(injected))?;
                BreakpointRecord {
                    addr,
                    kind,
                    original: original.to_le_bytes(),
                    injected: injected.to_le_bytes(),
                    len,
                }
            }
            BreakpointKind::Hardware => BreakpointRecord {
                addr,
                kind,
                original: self.read_original(addr).unwrap_or(0).to_le_bytes(),
                injected: [0; 4],
                len: 0,
            },
        };

        tracing::debug!(addr = format_args!("{addr:#x}"), %kind, "breakpoint added");
        self.breakpoints.insert(record);
        Ok(())
    }

    /// Removes the breakpoint at `addr`, restoring the displaced bytes of a software one.
    ///
    /// Returns `false` when no breakpoint was planted there.
    ///
    /// # Errors
    ///
    /// The `BusError` of the debug-bus write restoring the original instruction.
    pub fn remove_breakpoint(&mut self, addr: u64) -> Result<bool, BusError> {
        let Some(bp) = self.breakpoints.remove(addr) else {
            tracing::warn!(addr = format_args!("{addr:#x}"), "no breakpoint to remove");
            return Ok(false);
        };
        if bp.kind == BreakpointKind::Software {
            self.debug_write(addr, bp.len, bp.original_word())?;
        }
        tracing::debug!(addr = format_args!("{addr:#x}"), kind = %bp.kind, "breakpoint removed");
        Ok(true)
    }

    /// Reads the instruction at `addr`; a half-word read covers compressed code at the end of
    /// a device.
    fn read_original(&mut self, addr: u64) -> Result<u32, BusError> {
        match self.debug_read(addr, 4) {
            Ok(word) => Ok(word as u32),
            Err(_) => self.debug_read(addr, 2).map(|half| half as u32),
        }
    }
}
