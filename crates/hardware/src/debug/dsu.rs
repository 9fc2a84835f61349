//! Debug Support Unit register map.
//!
//! The DSU is a window of four regions of 8-byte registers starting at `DSU_BASE`:
//!
//! ```text
//! base + 0x00000  region 0  CSRs           (4096 slots, by CSR number)
//! base + 0x08000  region 1  register file  (x0..x31, f0..f31, stack trace)
//! base + 0x10000  region 2  control        (run control, counters, breakpoints)
//! base + 0x18000  region 3  debug module   (DMI registers by DMI address)
//! ```
//!
//! `DsuMap` resolves register names to absolute addresses and absolute addresses back to a
//! `(region, index)` pair for the debug port.

use crate::common::constants::{
    DSU_BASE, DSU_REGION_COUNT, DSU_REGION_SIZE, GPR_COUNT, REG_ADDR_ERROR,
    STACK_TRACE_CNT_INDEX,
};
use crate::core::arch::csr::{self, csr_by_name};
use crate::isa::abi::{fpr_by_name, gpr_by_name};

/// Region numbers.
pub mod region {
    /// CSR array.
    pub const CSR: u32 = 0;
    /// Integer and floating-point register mirror plus stack trace.
    pub const REGS: u32 = 1;
    /// Run control and breakpoints.
    pub const CONTROL: u32 = 2;
    /// Debug-module registers.
    pub const DMI: u32 = 3;
}

/// Register indexes of the control region.
pub mod control {
    /// Run control: bit 0 halt, bit 1 stepping / breakpoint hit, bits 31:16 core id.
    pub const CONTROL: u64 = 0;
    /// Slots executed per step request.
    pub const STEPPING_MODE_STEPS: u64 = 1;
    /// Step counter (read-only).
    pub const CLOCK_CNT: u64 = 2;
    /// Executed-instruction counter (read-only).
    pub const EXECUTED_CNT: u64 = 3;
    /// Breakpoint control: bit 0 trap-on-break.
    pub const BR_CTRL: u64 = 4;
    /// Write an address to plant a software breakpoint.
    pub const ADD_BREAKPOINT: u64 = 5;
    /// Write an address to plant a hardware breakpoint.
    pub const ADD_HW_BREAKPOINT: u64 = 6;
    /// Write an address to remove its breakpoint.
    pub const REMOVE_BREAKPOINT: u64 = 7;
    /// Address of the last breakpoint hit.
    pub const BR_ADDRESS_FETCH: u64 = 8;
    /// Original instruction at the last breakpoint hit.
    pub const BR_INSTR_FETCH: u64 = 9;
}

/// Debug-module register addresses (region 3 indexes).
pub mod dmi {
    /// Abstract data 0.
    pub const DATA0: u64 = 0x04;
    /// Abstract data 1.
    pub const DATA1: u64 = 0x05;
    /// Debug module control.
    pub const DMCONTROL: u64 = 0x10;
    /// Debug module status.
    pub const DMSTATUS: u64 = 0x11;
    /// Hart information.
    pub const HARTINFO: u64 = 0x12;
    /// Halt summary 1.
    pub const HALTSUM1: u64 = 0x13;
    /// Abstract control and status.
    pub const ABSTRACTCS: u64 = 0x16;
    /// Abstract command.
    pub const COMMAND: u64 = 0x17;
    /// First program-buffer word.
    pub const PROGBUF0: u64 = 0x20;
    /// Last program-buffer word.
    pub const PROGBUF15: u64 = 0x2F;
    /// Halt summary 2.
    pub const HALTSUM2: u64 = 0x34;
    /// Halt summary 3.
    pub const HALTSUM3: u64 = 0x35;
    /// System bus access control and status.
    pub const SBCS: u64 = 0x38;
    /// System bus address, low word.
    pub const SBADDRESS0: u64 = 0x39;
    /// System bus data, low word.
    pub const SBDATA0: u64 = 0x3C;
    /// Halt summary 0.
    pub const HALTSUM0: u64 = 0x40;
    /// Bus-utilization counters: `BUS_UTIL + 2 * master` writes, `+ 1` reads.
    pub const BUS_UTIL: u64 = 0x80;
}

const CONTROL_NAMES: &[(&str, u64)] = &[
    ("control", control::CONTROL),
    ("stepping_mode_steps", control::STEPPING_MODE_STEPS),
    ("clock_cnt", control::CLOCK_CNT),
    ("executed_cnt", control::EXECUTED_CNT),
    ("br_ctrl", control::BR_CTRL),
    ("add_breakpoint", control::ADD_BREAKPOINT),
    ("add_hw_breakpoint", control::ADD_HW_BREAKPOINT),
    ("remove_breakpoint", control::REMOVE_BREAKPOINT),
    ("br_address_fetch", control::BR_ADDRESS_FETCH),
    ("br_instr_fetch", control::BR_INSTR_FETCH),
];

const DMI_NAMES: &[(&str, u64)] = &[
    ("data0", dmi::DATA0),
    ("data1", dmi::DATA1),
    ("dmcontrol", dmi::DMCONTROL),
    ("dmstatus", dmi::DMSTATUS),
    ("hartinfo", dmi::HARTINFO),
    ("haltsum0", dmi::HALTSUM0),
    ("haltsum1", dmi::HALTSUM1),
    ("haltsum2", dmi::HALTSUM2),
    ("haltsum3", dmi::HALTSUM3),
    ("abstractcs", dmi::ABSTRACTCS),
    ("command", dmi::COMMAND),
    ("sbcs", dmi::SBCS),
    ("sbaddress0", dmi::SBADDRESS0),
    ("sbdata0", dmi::SBDATA0),
];

/// Register-name and address translation for one DSU instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DsuMap {
    base: u64,
}

impl Default for DsuMap {
    fn default() -> Self {
        Self::new(DSU_BASE)
    }
}

impl DsuMap {
    /// Map of a DSU mapped at `base`.
    pub fn new(base: u64) -> Self {
        Self { base }
    }

    /// Base address of region 0.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Absolute address of register `index` in `region`.
    pub fn addr_of(&self, region: u32, index: u64) -> u64 {
        self.base + u64::from(region) * DSU_REGION_SIZE + index * 8
    }

    /// Resolves a register name to its absolute address.
    ///
    /// Accepts `x0..x31` and ABI names, `f0..f31` and ABI names, CSR names, `pc`/`npc`
    /// (aliases of `dpc`), control-region names, `stack_trace_cnt` and debug-module register
    /// names. Returns `REG_ADDR_ERROR` for anything else.
    pub fn reg_addr(&self, name: &str) -> u64 {
        self.lookup(name)
            .map_or(REG_ADDR_ERROR, |(region, index)| self.addr_of(region, index))
    }

    /// Resolves a register name to its `(region, index)` pair.
    pub fn lookup(&self, name: &str) -> Option<(u32, u64)> {
        let name = name.trim().to_ascii_lowercase();
        if let Some(idx) = gpr_by_name(&name) {
            return Some((region::REGS, idx as u64));
        }
        if let Some(idx) = fpr_by_name(&name) {
            return Some((region::REGS, (GPR_COUNT + idx) as u64));
        }
        if name == "pc" || name == "npc" {
            return Some((region::CSR, u64::from(csr::DPC)));
        }
        if let Some(addr) = csr_by_name(&name) {
            return Some((region::CSR, u64::from(addr)));
        }
        if name == "stack_trace_cnt" {
            return Some((region::REGS, STACK_TRACE_CNT_INDEX));
        }
        if let Some(&(_, idx)) = CONTROL_NAMES.iter().find(|(n, _)| *n == name) {
            return Some((region::CONTROL, idx));
        }
        if let Some(&(_, idx)) = DMI_NAMES.iter().find(|(n, _)| *n == name) {
            return Some((region::DMI, idx));
        }
        let n = name.strip_prefix("progbuf")?.parse::<u64>().ok()?;
        (n < 16).then_some((region::DMI, dmi::PROGBUF0 + n))
    }

    /// Splits an absolute address into `(region, index)`.
    ///
    /// Returns `None` outside the window or for addresses not on an 8-byte slot boundary.
    pub fn decode(&self, addr: u64) -> Option<(u32, u64)> {
        let off = addr.checked_sub(self.base)?;
        let region = off / DSU_REGION_SIZE;
        if region >= u64::from(DSU_REGION_COUNT) || off % 8 != 0 {
            return None;
        }
        Some((region as u32, (off % DSU_REGION_SIZE) / 8))
    }

    /// Returns `true` if `addr` falls inside the DSU window.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr - self.base < DSU_REGION_SIZE * u64::from(DSU_REGION_COUNT)
    }

    /// Every name `reg_addr` resolves, for help output.
    pub fn names() -> impl Iterator<Item = &'static str> {
        crate::isa::abi::GPR_NAMES
            .iter()
            .chain(crate::isa::abi::FPR_NAMES.iter())
            .copied()
            .chain(["pc", "npc", "stack_trace_cnt"])
            .chain(csr::CSR_NAMES.iter().map(|(n, _)| *n))
            .chain(CONTROL_NAMES.iter().map(|(n, _)| *n))
            .chain(DMI_NAMES.iter().map(|(n, _)| *n))
    }
}
