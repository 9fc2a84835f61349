//! Trap Handling Logic.
//!
//! This module implements trap raising and delivery for the machine-mode core. It performs
//! the following:
//! 1. **Raising:** Instructions record one synchronous exception per slot; interrupt sources
//!    set bits in the interrupt-pending latch.
//! 2. **Delivery:** After the PC commit of each slot, a pending exception, else the
//!    highest-priority enabled interrupt, is taken through `mtvec`.
//! 3. **Debugger Hand-off:** `ebreak` halts the core unless trap-on-break is set, and traps
//!    with no handler installed halt the core when so configured.
//! 4. **Return Handling:** `mret`.

use super::Cpu;
use crate::common::Trap;
use crate::core::arch::csr::{
    self, DCSR_CAUSE_EBREAK, DCSR_CAUSE_HALTREQ, MIP_MEIP, MIP_MSIP, MIP_MTIP, MSTATUS_MIE,
    MSTATUS_MPIE, MSTATUS_MPP,
};

/// Mask of the exception/interrupt code in `mcause`.
const CAUSE_CODE_MASK: u64 = 0x3F;

impl Cpu {
    /// Records `trap` for delivery at the end of the current slot.
    ///
    /// Only the first exception of a slot is kept.
    pub fn raise_exception(&mut self, trap: Trap) {
        if self.pending_trap.is_none() {
            tracing::debug!(pc = format_args!("{:#x}", self.pc), %trap, "exception raised");
            self.pending_trap = Some(trap);
        }
    }

    /// Latches the pending bit of interrupt `trap`; delivered once `mie` and `mstatus.MIE`
    /// allow it.
    pub fn raise_interrupt(&mut self, trap: &Trap) {
        if trap.is_interrupt() {
            self.irq_latch |= 1 << (trap.cause() & CAUSE_CODE_MASK);
        } else {
            tracing::warn!(%trap, "raise_interrupt called with an exception");
        }
    }

    /// Clears the latched pending bit of interrupt `trap`.
    pub fn clear_interrupt(&mut self, trap: &Trap) {
        if trap.is_interrupt() {
            self.irq_latch &= !(1 << (trap.cause() & CAUSE_CODE_MASK));
        }
    }

    /// Handles `ebreak`/`c.ebreak` of length `len` at `pc`.
    pub fn ebreak(&mut self, len: u32) {
        let pc = self.pc;
        if self.br_ctrl.trap_on_break() {
            self.raise_exception(Trap::Breakpoint(pc));
            return;
        }
        match self.breakpoints.get(pc).copied() {
            Some(bp) => self.hit_breakpoint(bp.original_word(), DCSR_CAUSE_EBREAK, "Breakpoint"),
            None => {
                // A breakpoint compiled into the program: resume after it.
                let word = u64::from(u32::from_le_bytes(self.cache_line));
                let word = if len == 2 { word & 0xFFFF } else { word };
                self.br_hit = true;
                self.stats.breakpoint_hits += 1;
                self.last_br_addr = pc;
                self.last_br_inst = word;
                self.enter_halt(DCSR_CAUSE_EBREAK, Some("Breakpoint"));
            }
        }
    }

    /// Halts on a planted breakpoint at `pc`; the next resume executes `original` once.
    pub(crate) fn hit_breakpoint(&mut self, original: u64, cause: u64, reason: &str) {
        let pc = self.pc;
        self.br_hit = true;
        self.stats.breakpoint_hits += 1;
        self.last_br_addr = pc;
        self.last_br_inst = original;
        self.npc = pc;
        self.branch = true;
        self.skip_breakpoint = Some(pc);
        self.enter_halt(cause, Some(reason));
    }

    /// Executes `mret`.
    pub fn mret(&mut self) {
        self.npc = self.csrs.read(csr::MEPC) & !1;
        self.branch = true;
        let mut mstatus = self.csrs.read(csr::MSTATUS);
        if mstatus & MSTATUS_MPIE != 0 {
            mstatus |= MSTATUS_MIE;
        } else {
            mstatus &= !MSTATUS_MIE;
        }
        mstatus |= MSTATUS_MPIE | MSTATUS_MPP;
        self.csrs.write(csr::MSTATUS, mstatus);
    }

    /// Delivers the pending exception, else a pending enabled interrupt.
    pub(crate) fn check_traps(&mut self) {
        if let Some(trap) = self.pending_trap.take() {
            let epc = self.pc;
            self.take_trap(&trap, epc);
            return;
        }
        if !self.is_running() {
            return;
        }
        if self.csrs.read(csr::MSTATUS) & MSTATUS_MIE == 0 {
            return;
        }
        let pending = self.read_csr(csr::MIP) & self.csrs.read(csr::MIE);
        let trap = if pending & MIP_MEIP != 0 {
            Trap::MachineExternalInterrupt
        } else if pending & MIP_MSIP != 0 {
            Trap::MachineSoftwareInterrupt
        } else if pending & MIP_MTIP != 0 {
            Trap::MachineTimerInterrupt
        } else {
            return;
        };
        let epc = self.npc;
        self.take_trap(&trap, epc);
    }

    fn take_trap(&mut self, trap: &Trap, epc: u64) {
        self.stats.traps += 1;
        let mtvec = self.csrs.read(csr::MTVEC);
        let base = mtvec & !3;

        if base == 0 && self.halt_on_unhandled_trap {
            self.npc = epc;
            self.skip_breakpoint = None;
            let reason = format!("Unhandled trap: {trap}");
            self.enter_halt(DCSR_CAUSE_HALTREQ, Some(&reason));
            return;
        }

        tracing::debug!(
            %trap,
            epc = format_args!("{epc:#x}"),
            handler = format_args!("{base:#x}"),
            "trap taken"
        );

        self.csrs.write(csr::MEPC, epc);
        self.csrs.write(csr::MCAUSE, trap.cause());
        self.csrs.write(csr::MTVAL, trap.tval());

        let mut mstatus = self.csrs.read(csr::MSTATUS);
        if mstatus & MSTATUS_MIE != 0 {
            mstatus |= MSTATUS_MPIE;
        } else {
            mstatus &= !MSTATUS_MPIE;
        }
        mstatus = (mstatus & !MSTATUS_MIE) | MSTATUS_MPP;
        self.csrs.write(csr::MSTATUS, mstatus);

        let code = trap.cause() & CAUSE_CODE_MASK;
        let vectored = mtvec & 1 != 0 && trap.is_interrupt();
        if trap.is_interrupt() {
            self.irq_latch &= !(1 << code);
        }
        self.npc = if vectored {
            base.wrapping_add(4 * code)
        } else {
            base
        };
    }
}
