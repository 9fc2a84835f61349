//! Debug-port servicing.
//!
//! The core answers debug-port transactions itself, at the top of a step or inline with the
//! submission while powered off. Each region decodes its register index:
//!
//! | Region | Contents                                                       |
//! |--------|----------------------------------------------------------------|
//! | 0      | CSRs, indexed by CSR number                                    |
//! | 1      | `x0..x31`, `f0..f31`, stack-trace count and buffer             |
//! | 2      | run control, counters, breakpoint control and mutation         |
//! | 3      | debug-module registers at their DMI addresses                  |

use crate::common::constants::{
    CORE_ID, FPR_COUNT, GPR_COUNT, STACK_TRACE_BUF_INDEX, STACK_TRACE_CNT_INDEX,
};
use crate::core::breakpoint::BreakpointKind;
use crate::core::{Cpu, RunState};
use crate::debug::bridge::DebugPortTransaction;
use crate::debug::dsu::{control, region};
use crate::debug::regs::{BreakpointControl, DsuControl};

impl Cpu {
    /// Performs `trans` against the register regions, filling `rdata` on reads.
    ///
    /// Unknown regions and indexes read as zero and ignore writes.
    pub fn service_debug_port(&mut self, trans: &mut DebugPortTransaction) {
        tracing::debug!(
            region = trans.region,
            index = format_args!("{:#x}", trans.addr),
            write = trans.write,
            wdata = format_args!("{:#x}", trans.wdata),
            "debug-port access"
        );
        trans.rdata = 0;
        match trans.region {
            region::CSR => self.service_csr(trans),
            region::REGS => self.service_regs(trans),
            region::CONTROL => self.service_control(trans),
            region::DMI => self.service_dmi(trans),
            other => tracing::warn!(region = other, "debug-port access to unknown region"),
        }
    }

    fn service_csr(&mut self, trans: &mut DebugPortTransaction) {
        let Ok(addr) = u32::try_from(trans.addr) else {
            tracing::warn!(index = trans.addr, "CSR index out of range");
            return;
        };
        if addr > 0xFFF {
            tracing::warn!(index = trans.addr, "CSR index out of range");
        } else if trans.write {
            self.write_csr(addr, trans.wdata);
        } else {
            trans.rdata = self.read_csr(addr);
        }
    }

    fn service_regs(&mut self, trans: &mut DebugPortTransaction) {
        let gprs = GPR_COUNT as u64;
        let fprs = FPR_COUNT as u64;
        match trans.addr {
            idx if idx < gprs => {
                if trans.write {
                    self.regs.write(idx as usize, trans.wdata);
                } else {
                    trans.rdata = self.regs.read(idx as usize);
                }
            }
            idx if idx < gprs + fprs => {
                let f = (idx - gprs) as usize;
                if trans.write {
                    self.write_fpr(f, trans.wdata);
                } else {
                    trans.rdata = self.read_fpr(f);
                }
            }
            STACK_TRACE_CNT_INDEX => {
                if trans.write {
                    self.stack_trace_cnt = trans.wdata;
                } else {
                    trans.rdata = self.stack_trace_cnt;
                }
            }
            idx if idx >= STACK_TRACE_BUF_INDEX => {
                if !trans.write {
                    trans.rdata = self.stack_trace_word(idx - STACK_TRACE_BUF_INDEX);
                }
            }
            idx => tracing::warn!(index = idx, "unmapped register-file index"),
        }
    }

    fn service_control(&mut self, trans: &mut DebugPortTransaction) {
        match (trans.addr, trans.write) {
            (control::CONTROL, false) => {
                let mut reg = DsuControl(0);
                reg.set_halt(self.state == RunState::Halted);
                reg.set_breakpoint(self.br_hit);
                reg.set_core_id(CORE_ID);
                trans.rdata = reg.0;
            }
            (control::CONTROL, true) => {
                let reg = DsuControl(trans.wdata);
                let result = if reg.halt() {
                    self.halt(None)
                } else if reg.stepping() {
                    self.step()
                } else {
                    self.go()
                };
                if let Err(e) = result {
                    tracing::warn!("control register write: {e}");
                }
            }
            (control::STEPPING_MODE_STEPS, false) => trans.rdata = self.stepping_count,
            (control::STEPPING_MODE_STEPS, true) => self.stepping_count = trans.wdata,
            (control::CLOCK_CNT, false) => trans.rdata = self.step_cnt,
            (control::EXECUTED_CNT, false) => trans.rdata = self.executed_cnt,
            (control::BR_CTRL, false) => trans.rdata = self.br_ctrl.0,
            (control::BR_CTRL, true) => self.br_ctrl = BreakpointControl(trans.wdata),
            (control::ADD_BREAKPOINT, true) => {
                self.control_add_breakpoint(trans.wdata, BreakpointKind::Software);
            }
            (control::ADD_HW_BREAKPOINT, true) => {
                self.control_add_breakpoint(trans.wdata, BreakpointKind::Hardware);
            }
            (control::REMOVE_BREAKPOINT, true) => {
                if let Err(e) = self.remove_breakpoint(trans.wdata) {
                    tracing::warn!(addr = format_args!("{:#x}", trans.wdata), "{e}");
                }
            }
            (control::BR_ADDRESS_FETCH, false) => trans.rdata = self.last_br_addr,
            (control::BR_INSTR_FETCH, false) => trans.rdata = self.last_br_inst,
            (idx, write) => tracing::warn!(
                index = idx,
                write,
                "unsupported control-region access"
            ),
        }
    }

    fn control_add_breakpoint(&mut self, addr: u64, kind: BreakpointKind) {
        if let Err(e) = self.add_breakpoint(addr, kind) {
            tracing::warn!(addr = format_args!("{addr:#x}"), %kind, "breakpoint not planted: {e}");
        }
    }
}
