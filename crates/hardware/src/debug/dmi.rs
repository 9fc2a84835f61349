//! Debug-module registers (region 3).
//!
//! This module implements the subset of the RISC-V external debug module exposed through the
//! DSU. It provides:
//! 1. **Run Control:** `dmcontrol`/`dmstatus` with halt and resume requests, `ndmreset`, and
//!    the `havereset`/`resumeack` handshakes.
//! 2. **Abstract Commands:** Access-register commands over `data0`/`data1` for CSRs, GPRs
//!    and FPRs while the hart is halted.
//! 3. **System Bus Access:** `sbcs`/`sbaddress0`/`sbdata0` through the debug bus, with
//!    auto-increment and read-on-address/read-on-data.
//! 4. **Bus Utilization:** Per-master transaction counters.

use crate::common::BusError;
use crate::common::constants::{BUS_MASTER_COUNT, FPR_COUNT, GPR_COUNT};
use crate::core::arch::csr::DCSR_CAUSE_HALTREQ;
use crate::core::{Cpu, RunState};
use crate::debug::bridge::DebugPortTransaction;
use crate::debug::dsu::dmi;
use crate::debug::regs::{
    Abstractcs, AccessRegisterCommand, Dmcontrol, Dmstatus, Hartinfo, Sbcs, cmderr, sberror,
};

/// Debug-module version reported in `dmstatus` (0.13).
const DM_VERSION: u32 = 2;
/// System-bus access version reported in `sbcs` (1.0).
const SB_VERSION: u32 = 1;
/// Width of `sbaddress` in bits.
const SB_ADDRESS_BITS: u32 = 64;
/// Number of abstract data registers.
const DATA_COUNT: usize = 2;
/// Number of program-buffer words.
const PROGBUF_SIZE: usize = 16;
/// Scratch registers advertised in `hartinfo`.
const NSCRATCH: u32 = 2;

const REGNO_CSR_LAST: u32 = 0x0FFF;
const REGNO_GPR0: u32 = 0x1000;
const REGNO_FPR0: u32 = REGNO_GPR0 + GPR_COUNT as u32;
const REGNO_FPR_END: u32 = REGNO_FPR0 + FPR_COUNT as u32;

/// State held by the debug module between accesses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DmiState {
    /// Abstract data registers.
    pub data: [u32; DATA_COUNT],
    /// Program buffer; stored, never executed.
    pub progbuf: [u32; PROGBUF_SIZE],
    /// `abstractcs.cmderr`.
    pub cmderr: u32,
    /// Writable `sbcs` fields.
    pub sbcs: Sbcs,
    /// System-bus address.
    pub sbaddress: u64,
    /// System-bus data.
    pub sbdata: u64,
    /// `dmcontrol.dmactive`.
    pub dmactive: bool,
    /// `dmcontrol.ndmreset`.
    pub ndmreset: bool,
    /// Set when a resume request was acknowledged.
    pub resumeack: bool,
    /// Set by hart reset until acknowledged.
    pub havereset: bool,
}

impl DmiState {
    /// Records a hart reset.
    pub fn on_reset(&mut self) {
        self.havereset = true;
        self.resumeack = false;
    }

    fn sb_size(&self) -> Option<usize> {
        match self.sbcs.sbaccess() {
            a @ 0..=3 => Some(1 << a),
            _ => None,
        }
    }
}

fn sberror_of(e: &BusError) -> u32 {
    match e {
        BusError::Unmapped(_) => sberror::BAD_ADDRESS,
        BusError::Misaligned { .. } => sberror::ALIGNMENT,
        BusError::Unsupported(_) => sberror::SIZE,
    }
}

impl Cpu {
    /// Performs a region-3 access at DMI address `trans.addr`.
    pub(crate) fn service_dmi(&mut self, trans: &mut DebugPortTransaction) {
        let util_end = dmi::BUS_UTIL + 2 * BUS_MASTER_COUNT as u64;
        match trans.addr {
            a @ (dmi::DATA0 | dmi::DATA1) => {
                let i = (a - dmi::DATA0) as usize;
                if trans.write {
                    self.dmi.data[i] = trans.wdata as u32;
                } else {
                    trans.rdata = u64::from(self.dmi.data[i]);
                }
            }
            dmi::DMCONTROL => {
                if trans.write {
                    self.write_dmcontrol(Dmcontrol(trans.wdata as u32));
                } else {
                    let mut v = Dmcontrol(0);
                    v.set_dmactive(self.dmi.dmactive);
                    v.set_ndmreset(self.dmi.ndmreset);
                    trans.rdata = u64::from(v.0);
                }
            }
            dmi::DMSTATUS => trans.rdata = u64::from(self.dmstatus().0),
            dmi::HARTINFO => {
                let mut v = Hartinfo(0);
                v.set_nscratch(NSCRATCH);
                trans.rdata = u64::from(v.0);
            }
            dmi::HALTSUM0 | dmi::HALTSUM1 | dmi::HALTSUM2 | dmi::HALTSUM3 => {
                trans.rdata = u64::from(self.state == RunState::Halted);
            }
            dmi::ABSTRACTCS => {
                if trans.write {
                    let w1c = Abstractcs(trans.wdata as u32).cmderr();
                    self.dmi.cmderr &= !w1c;
                } else {
                    let mut v = Abstractcs(0);
                    v.set_datacount(DATA_COUNT as u32);
                    v.set_progbufsize(PROGBUF_SIZE as u32);
                    v.set_cmderr(self.dmi.cmderr);
                    trans.rdata = u64::from(v.0);
                }
            }
            dmi::COMMAND => {
                if trans.write {
                    self.abstract_command(AccessRegisterCommand(trans.wdata as u32));
                }
            }
            a @ dmi::PROGBUF0..=dmi::PROGBUF15 => {
                let i = (a - dmi::PROGBUF0) as usize;
                if trans.write {
                    self.dmi.progbuf[i] = trans.wdata as u32;
                } else {
                    trans.rdata = u64::from(self.dmi.progbuf[i]);
                }
            }
            dmi::SBCS => {
                if trans.write {
                    self.write_sbcs(Sbcs(trans.wdata as u32));
                } else {
                    trans.rdata = u64::from(self.sbcs().0);
                }
            }
            dmi::SBADDRESS0 => {
                if trans.write {
                    self.dmi.sbaddress = trans.wdata;
                    if self.dmi.sbcs.sbreadonaddr() {
                        self.sb_read();
                    }
                } else {
                    trans.rdata = self.dmi.sbaddress;
                }
            }
            dmi::SBDATA0 => {
                if trans.write {
                    self.dmi.sbdata = trans.wdata;
                    self.sb_write();
                } else {
                    trans.rdata = self.dmi.sbdata;
                    if self.dmi.sbcs.sbreadondata() {
                        self.sb_read();
                    }
                }
            }
            a if (dmi::BUS_UTIL..util_end).contains(&a) && !trans.write => {
                let util = &self.bus_util[((a - dmi::BUS_UTIL) / 2) as usize];
                trans.rdata = if (a - dmi::BUS_UTIL) % 2 == 0 {
                    util.writes
                } else {
                    util.reads
                };
            }
            a => tracing::warn!(
                dmi = format_args!("{a:#x}"),
                write = trans.write,
                "unsupported debug-module access"
            ),
        }
    }

    fn write_dmcontrol(&mut self, v: Dmcontrol) {
        if !v.dmactive() {
            let havereset = self.dmi.havereset;
            self.dmi = DmiState {
                havereset,
                ..DmiState::default()
            };
            return;
        }
        self.dmi.dmactive = true;

        if v.ndmreset() != self.dmi.ndmreset {
            self.dmi.ndmreset = v.ndmreset();
            self.reset(v.ndmreset());
        }
        if v.ackhavereset() {
            self.dmi.havereset = false;
        }

        if v.haltreq() {
            if self.is_running() {
                self.enter_halt(DCSR_CAUSE_HALTREQ, None);
            }
        } else if v.resumereq() && self.state == RunState::Halted {
            let result = if self.dcsr_step() {
                self.step_by(1)
            } else {
                self.go()
            };
            match result {
                Ok(()) => self.dmi.resumeack = true,
                Err(e) => tracing::warn!("resume request: {e}"),
            }
        }
    }

    fn dmstatus(&self) -> Dmstatus {
        let mut v = Dmstatus(0);
        v.set_version(DM_VERSION);
        v.set_authenticated(true);
        let halted = self.state == RunState::Halted;
        let running = self.is_running();
        let unavail = self.state == RunState::Off;
        v.set_allhalted(halted);
        v.set_anyhalted(halted);
        v.set_allrunning(running);
        v.set_anyrunning(running);
        v.set_allunavail(unavail);
        v.set_anyunavail(unavail);
        v.set_allresumeack(self.dmi.resumeack);
        v.set_anyresumeack(self.dmi.resumeack);
        v.set_allhavereset(self.dmi.havereset);
        v.set_anyhavereset(self.dmi.havereset);
        v
    }

    fn abstract_command(&mut self, cmd: AccessRegisterCommand) {
        if self.dmi.cmderr != cmderr::NONE {
            tracing::debug!(cmderr = self.dmi.cmderr, "abstract command ignored until cmderr is cleared");
            return;
        }
        if self.state != RunState::Halted {
            self.dmi.cmderr = cmderr::HALT_RESUME;
            return;
        }
        if cmd.cmdtype() != 0 || cmd.postexec() || cmd.aarpostincrement() {
            self.dmi.cmderr = cmderr::NOT_SUPPORTED;
            return;
        }
        if !cmd.transfer() {
            return;
        }
        let wide = match cmd.aarsize() {
            2 => false,
            3 => true,
            _ => {
                self.dmi.cmderr = cmderr::NOT_SUPPORTED;
                return;
            }
        };

        let regno = cmd.regno();
        if regno >= REGNO_FPR_END {
            self.dmi.cmderr = cmderr::EXCEPTION;
            return;
        }

        if cmd.write() {
            let mut val = u64::from(self.dmi.data[0]);
            if wide {
                val |= u64::from(self.dmi.data[1]) << 32;
            }
            match regno {
                r if r <= REGNO_CSR_LAST => self.write_csr(r, val),
                r if r < REGNO_FPR0 => self.regs.write((r - REGNO_GPR0) as usize, val),
                r => self.write_fpr((r - REGNO_FPR0) as usize, val),
            }
        } else {
            let val = match regno {
                r if r <= REGNO_CSR_LAST => self.read_csr(r),
                r if r < REGNO_FPR0 => self.regs.read((r - REGNO_GPR0) as usize),
                r => self.read_fpr((r - REGNO_FPR0) as usize),
            };
            self.dmi.data[0] = val as u32;
            if wide {
                self.dmi.data[1] = (val >> 32) as u32;
            }
        }
        tracing::debug!(regno = format_args!("{regno:#x}"), write = cmd.write(), "access register");
    }

    fn sbcs(&self) -> Sbcs {
        let mut v = self.dmi.sbcs;
        v.set_sbversion(SB_VERSION);
        v.set_sbasize(SB_ADDRESS_BITS);
        v.set_sbaccess8(true);
        v.set_sbaccess16(true);
        v.set_sbaccess32(true);
        v.set_sbaccess64(true);
        v
    }

    fn write_sbcs(&mut self, v: Sbcs) {
        let s = &mut self.dmi.sbcs;
        s.set_sbreadonaddr(v.sbreadonaddr());
        s.set_sbaccess(v.sbaccess());
        s.set_sbautoincrement(v.sbautoincrement());
        s.set_sbreadondata(v.sbreadondata());
        let err = s.sberror() & !v.sberror();
        s.set_sberror(err);
    }

    /// Size of the next system-bus access, or `None` (with `sberror` set) when it must not run.
    fn sb_access_size(&mut self) -> Option<usize> {
        if self.dmi.sbcs.sberror() != sberror::NONE {
            return None;
        }
        let size = self.dmi.sb_size();
        if size.is_none() {
            self.dmi.sbcs.set_sberror(sberror::SIZE);
        }
        size
    }

    fn sb_read(&mut self) {
        let Some(size) = self.sb_access_size() else {
            return;
        };
        match self.debug_read(self.dmi.sbaddress, size) {
            Ok(v) => {
                self.dmi.sbdata = v;
                self.sb_autoincrement(size);
            }
            Err(e) => self.dmi.sbcs.set_sberror(sberror_of(&e)),
        }
    }

    fn sb_write(&mut self) {
        let Some(size) = self.sb_access_size() else {
            return;
        };
        match self.debug_write(self.dmi.sbaddress, size, self.dmi.sbdata) {
            Ok(()) => self.sb_autoincrement(size),
            Err(e) => self.dmi.sbcs.set_sberror(sberror_of(&e)),
        }
    }

    fn sb_autoincrement(&mut self, size: usize) {
        if self.dmi.sbcs.sbautoincrement() {
            self.dmi.sbaddress = self.dmi.sbaddress.wrapping_add(size as u64);
        }
    }
}
