//! Run-Control.
//!
//! This module implements the verbs that move the core between run states. It provides:
//! 1. **Resume:** `go` and `step`, rejected while the core is off.
//! 2. **Halt:** `halt` and the internal halt path shared by breakpoints, stepping and traps,
//!    which writes the diagnostic line and notifies hap observers.
//! 3. **Reset:** `reset(true)` powers the core off; `reset(false)` powers it on.
//! 4. **Haps:** Delivery of notifications to registered observers.

use super::{Cpu, Hap, RunState};
use crate::common::ControlError;
use crate::common::constants::DEFAULT_HALT_REASON;
use crate::core::arch::csr::{
    self, DCSR_CAUSE_HALTREQ, DCSR_CAUSE_MASK, DCSR_CAUSE_SHIFT, DCSR_PRV_M, DCSR_XDEBUGVER,
};

impl Cpu {
    /// Resumes free-running execution.
    ///
    /// # Errors
    ///
    /// `ControlError::NotPowered` while the core is off.
    pub fn go(&mut self) -> Result<(), ControlError> {
        self.ensure_powered()?;
        tracing::debug!(pc = format_args!("{:#x}", self.npc), "run-control: go");
        self.state = RunState::Normal;
        Ok(())
    }

    /// Executes `stepping_count` slots, then halts.
    ///
    /// # Errors
    ///
    /// `ControlError::NotPowered` while the core is off.
    pub fn step(&mut self) -> Result<(), ControlError> {
        self.step_by(self.stepping_count)
    }

    /// Executes `count` slots, then halts.
    ///
    /// # Errors
    ///
    /// `ControlError::NotPowered` while the core is off.
    pub fn step_by(&mut self, count: u64) -> Result<(), ControlError> {
        self.ensure_powered()?;
        self.step_budget = self.step_cnt.saturating_add(count);
        tracing::debug!(
            step = self.step_cnt,
            budget = self.step_budget,
            "run-control: step"
        );
        self.state = RunState::Stepping;
        Ok(())
    }

    /// Halts the core.
    ///
    /// `reason` ends the diagnostic line; `None` prints the default text.
    ///
    /// # Errors
    ///
    /// `ControlError::NotPowered` while the core is off.
    pub fn halt(&mut self, reason: Option<&str>) -> Result<(), ControlError> {
        self.ensure_powered()?;
        self.enter_halt(DCSR_CAUSE_HALTREQ, reason);
        Ok(())
    }

    /// Asserts (`true`) or deasserts (`false`) reset.
    ///
    /// Both edges clear the interrupt latch, the stack-trace count and the status registers.
    /// Asserting powers the core off and drops pending step callbacks. Deasserting powers an
    /// off core on at the reset vector and re-arms device step callbacks; on a powered core it
    /// does nothing more.
    pub fn reset(&mut self, active: bool) {
        self.irq_latch = 0;
        self.stack_trace_cnt = 0;
        self.pending_trap = None;
        self.br_hit = false;
        self.skip_breakpoint = None;
        self.csrs.write(csr::MSTATUS, 0);
        self.csrs.write(csr::MCAUSE, 0);
        self.csrs.write(csr::MIP, 0);
        self.csrs.write(csr::DCSR, DCSR_XDEBUGVER | DCSR_PRV_M);
        self.dmi.on_reset();

        if active {
            self.events.clear();
            if self.state != RunState::Off {
                tracing::info!(step = self.step_cnt, "CPU turned off");
            }
            self.state = RunState::Off;
            self.notify(&Hap::CpuTurnedOff);
        } else if self.state == RunState::Off {
            self.pc = self.reset_vector;
            self.npc = self.reset_vector;
            self.state = RunState::Normal;
            self.arm_step_devices();
            tracing::info!(
                reset_vector = format_args!("{:#x}", self.reset_vector),
                "CPU turned on"
            );
            self.notify(&Hap::CpuTurnedOn);
        }
    }

    /// Sends `hap` to every registered observer.
    pub fn notify(&mut self, hap: &Hap) {
        for handler in &mut self.haps {
            handler(hap);
        }
    }

    pub(crate) fn ensure_powered(&self) -> Result<(), ControlError> {
        if self.state == RunState::Off {
            tracing::warn!("run-control rejected: CPU is turned-off");
            return Err(ControlError::NotPowered);
        }
        Ok(())
    }

    /// Enters `Halted`, records `cause` in `dcsr` and emits the diagnostic line.
    pub(crate) fn enter_halt(&mut self, cause: u64, reason: Option<&str>) {
        let dcsr = self.csrs.read(csr::DCSR) & !(DCSR_CAUSE_MASK << DCSR_CAUSE_SHIFT);
        self.csrs
            .write(csr::DCSR, dcsr | ((cause & DCSR_CAUSE_MASK) << DCSR_CAUSE_SHIFT));

        self.state = RunState::Halted;
        self.stats.halts += 1;

        let [b0, b1, b2, b3] = self.cache_line;
        self.last_halt_message = format!(
            "[{}] pc:{:016x}: {:02x}{:02x}{:02x}{:02x} \t{}",
            self.step_cnt,
            self.pc,
            b3,
            b2,
            b1,
            b0,
            reason.unwrap_or(DEFAULT_HALT_REASON)
        );
        tracing::info!("{}", self.last_halt_message);

        let hap = Hap::Halt {
            step: self.step_cnt,
            pc: self.pc,
        };
        self.notify(&hap);
    }
}
