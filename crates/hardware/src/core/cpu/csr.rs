//! CSR Access Logic.
//!
//! This module implements Control and Status Register access for instructions and the debug
//! port. It performs the following:
//! 1. **Read Operations:** Counters mirror the step and executed counters, `dpc` mirrors `npc`,
//!    `mip` includes the interrupt latch and the device interrupt lines.
//! 2. **Write Operations:** Read-only registers ignore writes; `dpc` redirects `npc` and
//!    cancels a pending breakpoint skip.

use super::Cpu;
use crate::common::constants::CORE_ID;
use crate::core::arch::csr;

impl Cpu {
    /// Reads a CSR, applying read side effects.
    ///
    /// # Arguments
    ///
    /// * `addr` - The 12-bit address of the CSR to read.
    ///
    /// # Returns
    ///
    /// The current 64-bit value; unimplemented numbers read their raw storage (zero).
    pub fn read_csr(&self, addr: u32) -> u64 {
        match addr {
            csr::MHARTID => CORE_ID,
            csr::MVENDORID | csr::MARCHID | csr::MIMPID => 0,
            csr::MISA => csr::MISA_DEFAULT,
            csr::MCYCLE | csr::CYCLE => self.step_cnt,
            csr::MINSTRET | csr::INSTRET => self.executed_cnt,
            csr::MIP => self.csrs.read(csr::MIP) | self.irq_latch | self.irq_lines.pending(),
            csr::DPC => self.npc,
            _ => self.csrs.read(addr),
        }
    }

    /// Writes a CSR, applying write side effects.
    ///
    /// # Arguments
    ///
    /// * `addr` - The 12-bit address of the CSR to write.
    /// * `val` - The value to write.
    pub fn write_csr(&mut self, addr: u32, val: u64) {
        match addr {
            csr::MISA | csr::MCYCLE => {
                tracing::debug!(csr = format_args!("{addr:#x}"), "write to read-only CSR ignored");
            }
            _ if csr::is_read_only(addr) => {
                tracing::debug!(csr = format_args!("{addr:#x}"), "write to read-only CSR ignored");
            }
            csr::MINSTRET => self.executed_cnt = val,
            csr::DPC => {
                self.npc = val;
                self.skip_breakpoint = None;
            }
            csr::DCSR => {
                let fixed = csr::DCSR_XDEBUGVER | csr::DCSR_PRV_M;
                let cause = csr::DCSR_CAUSE_MASK << csr::DCSR_CAUSE_SHIFT;
                let keep = self.csrs.read(csr::DCSR) & cause;
                let writable = csr::DCSR_STEP | csr::DCSR_EBREAKM;
                self.csrs.write(csr::DCSR, fixed | keep | (val & writable));
            }
            csr::MTVEC => self.csrs.write(addr, val & !0b10),
            csr::MEPC => self.csrs.write(addr, val & !1),
            _ => self.csrs.write(addr, val),
        }
    }

    /// Returns `true` when `dcsr.step` is set, so a resume should single-step.
    pub fn dcsr_step(&self) -> bool {
        self.csrs.read(csr::DCSR) & csr::DCSR_STEP != 0
    }
}
