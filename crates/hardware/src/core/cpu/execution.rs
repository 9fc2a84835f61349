//! Main Execution Loop.
//!
//! This module implements the per-step cycle of the core. Each call to `update_pipeline`
//! performs the following:
//! 1. **Debug Port:** Services the pending debug-port transaction, if any, in every state.
//! 2. **State Machine:** Decides whether an instruction slot is consumed (`update_state`).
//! 3. **PC Commit:** `pc := npc`, then the hardware-breakpoint check that precedes fetch.
//! 4. **Execution:** Fetch, decode and execute one instruction, then the default `npc`.
//! 5. **Events:** Fires step callbacks due at the current step counter.
//! 6. **Traps:** Delivers the pending exception or interrupt.

use std::sync::Arc;

use super::{Cpu, RunState};
use crate::common::constants::INSTRUCTION_SIZE_32;
use crate::common::{DebugPortError, EventQueueError, Trap};
use crate::core::arch::csr::{DCSR_CAUSE_STEP, DCSR_CAUSE_TRIGGER};
use crate::core::breakpoint::BreakpointKind;
use crate::core::events::ListenerHandle;
use crate::debug::bridge::{DebugPortTransaction, ResponseCallback};
use crate::debug::trace::TraceRecord;
use crate::isa::decode::{decode, instruction_length};

impl Cpu {
    /// Runs one iteration of the step loop.
    ///
    /// # Returns
    ///
    /// `true` if an instruction slot was consumed (the step counter advanced by one).
    pub fn update_pipeline(&mut self) -> bool {
        if let Some((mut trans, callback)) = self.dport.take() {
            self.complete_debug(&mut trans, callback);
        }

        if !self.update_state() {
            return false;
        }

        self.pc = self.npc;
        self.branch = false;
        self.oplen = 0;
        self.br_hit = false;
        let skip = self.skip_breakpoint.take() == Some(self.pc);
        if self.trace_sink.is_some() {
            self.trace_record = TraceRecord {
                step: self.step_cnt,
                pc: self.pc,
                ..TraceRecord::default()
            };
        }

        if !skip && self.breakpoints.is_hardware(self.pc) {
            let original = self
                .breakpoints
                .get(self.pc)
                .map_or(0, |bp| bp.original_word());
            self.hit_breakpoint(original, DCSR_CAUSE_TRIGGER, "Hardware breakpoint");
            self.drain_events();
            return true;
        }

        self.execute_slot(skip);

        if !self.branch {
            self.npc = self.pc.wrapping_add(u64::from(self.oplen));
        }

        self.drain_events();
        self.check_traps();
        true
    }

    /// Advances the run-control state machine by one iteration.
    ///
    /// Returns `true` when an instruction slot is consumed; the step counter is incremented
    /// only on that path.
    pub fn update_state(&mut self) -> bool {
        match self.state {
            RunState::Off | RunState::Halted => {
                self.drain_events();
                false
            }
            RunState::Stepping if self.step_budget <= self.step_cnt => {
                self.enter_halt(DCSR_CAUSE_STEP, Some("Stepping breakpoint"));
                false
            }
            RunState::Stepping | RunState::Normal => {
                self.step_cnt += 1;
                self.stats.steps += 1;
                true
            }
        }
    }

    fn execute_slot(&mut self, skip: bool) {
        let pc = self.pc;
        let Some(mut raw) = self.fetch_line(pc) else {
            self.oplen = INSTRUCTION_SIZE_32;
            self.raise_exception(Trap::IllegalInstruction(0));
            return;
        };

        // Resuming from a software breakpoint: execute the displaced instruction.
        let displaced = if skip {
            self.breakpoints
                .get(pc)
                .filter(|bp| bp.kind == BreakpointKind::Software)
                .copied()
        } else {
            None
        };
        if let Some(bp) = displaced {
            let mask = if bp.len >= 4 {
                u32::MAX
            } else {
                (1u32 << (8 * bp.len)) - 1
            };
            raw = (raw & !mask) | (bp.original_word() as u32 & mask);
            self.cache_line = raw.to_le_bytes();
        }

        match decode(raw) {
            Some(inst) => {
                self.oplen = inst.exec(self, raw);
                self.executed_cnt += 1;
                self.stats.executed += 1;
            }
            None => {
                self.oplen = instruction_length(raw);
                self.raise_exception(Trap::IllegalInstruction(raw));
            }
        }

        if let Some(sink) = self.trace_sink.as_mut() {
            self.trace_record.raw = raw;
            sink.record(&self.trace_record);
        }
    }

    /// Fires every step callback due at the current step counter.
    ///
    /// Callbacks may schedule further callbacks; those are merged on the next drain.
    pub(crate) fn drain_events(&mut self) {
        self.events.push_pre_queued();
        let step = self.step_cnt;
        for listener in self.events.drain_due(step) {
            listener.on_step(step, &mut self.events);
        }
    }

    /// Schedules `listener` for the step counter value `trigger_step`.
    ///
    /// While the core is off, a listener whose step has already been reached is called
    /// immediately instead of being queued.
    ///
    /// # Errors
    ///
    /// `EventQueueError::CapacityExceeded` when a queue limit is configured and reached.
    pub fn register_step_callback(
        &mut self,
        listener: ListenerHandle,
        trigger_step: u64,
    ) -> Result<(), EventQueueError> {
        if self.state == RunState::Off && trigger_step <= self.step_cnt {
            listener.on_step(self.step_cnt, &mut self.events);
            return Ok(());
        }
        self.events.put(trigger_step, listener)
    }

    /// Attaches a device callback that fires every `period` steps while the core is powered.
    ///
    /// `listener` is expected to re-queue itself; it is armed now if the core is powered and
    /// again at every power-on, since asserting reset drops the queue.
    pub fn add_step_device(&mut self, listener: ListenerHandle, period: u64) {
        if self.state != RunState::Off {
            self.arm_step_device(&listener, period);
        }
        self.step_devices.push((listener, period));
    }

    pub(crate) fn arm_step_devices(&mut self) {
        let devices = self.step_devices.clone();
        for (listener, period) in &devices {
            self.arm_step_device(listener, *period);
        }
    }

    fn arm_step_device(&mut self, listener: &ListenerHandle, period: u64) {
        let trigger = self.step_cnt.saturating_add(period);
        if let Err(e) = self.events.put(trigger, Arc::clone(listener)) {
            tracing::warn!(trigger, "device step callback not armed: {e}");
        }
    }

    /// Submits a debug-port transaction.
    ///
    /// While the core is off the transaction is serviced and `callback` invoked before this
    /// returns, after any transaction still pending from before power-off. Otherwise it is
    /// serviced at the top of the next `update_pipeline`.
    ///
    /// # Errors
    ///
    /// `DebugPortError::Busy` if a transaction is already pending; the rejected transaction
    /// and callback are returned inside the error.
    pub fn submit_debug(
        &mut self,
        mut trans: DebugPortTransaction,
        callback: ResponseCallback,
    ) -> Result<(), DebugPortError> {
        if self.state == RunState::Off {
            if let Some((mut earlier, earlier_callback)) = self.dport.take() {
                self.complete_debug(&mut earlier, earlier_callback);
            }
            self.complete_debug(&mut trans, callback);
            return Ok(());
        }
        self.dport.submit(trans, callback)
    }

    fn complete_debug(&mut self, trans: &mut DebugPortTransaction, callback: ResponseCallback) {
        self.service_debug_port(trans);
        self.stats.debug_transactions += 1;
        callback(trans);
    }

    /// Redirects `npc` to `target` for a taken branch or jump.
    ///
    /// Returns `false` after raising an instruction-address-misaligned exception when
    /// `target` is not half-word aligned.
    pub fn set_branch(&mut self, target: u64) -> bool {
        if target & 1 != 0 {
            self.raise_exception(Trap::InstructionAddressMisaligned(target));
            return false;
        }
        self.npc = target;
        self.branch = true;
        true
    }
}
