//! Control and Status Register (CSR) definitions and storage.
//!
//! This module implements the CSR subsystem. It provides:
//! 1. **Address Definitions:** Constants for the machine-mode and debug-mode CSRs the core uses.
//! 2. **Field Masks:** Bitmasks for status, interrupt, ISA and debug-control fields.
//! 3. **Register Storage:** The `CsrFile` array, one 64-bit slot per CSR number, which is
//!    also the backing store of debug region 0.
//! 4. **Name Table:** CSR names accepted by the register-name lookup.
//!
//! Side effects of CSR accesses (counters, `dpc`, read-only registers) are applied by the
//! core, not here; `CsrFile` is plain storage.

use crate::common::constants::CSR_COUNT;

/// Machine vendor ID CSR address.
pub const MVENDORID: u32 = 0xF11;
/// Machine architecture ID CSR address.
pub const MARCHID: u32 = 0xF12;
/// Machine implementation ID CSR address.
pub const MIMPID: u32 = 0xF13;
/// Machine hardware thread ID CSR address.
pub const MHARTID: u32 = 0xF14;

/// Machine status register CSR address.
pub const MSTATUS: u32 = 0x300;
/// Machine ISA register CSR address.
pub const MISA: u32 = 0x301;
/// Machine interrupt enable register CSR address.
pub const MIE: u32 = 0x304;
/// Machine trap vector base address register CSR address.
pub const MTVEC: u32 = 0x305;
/// Machine scratch register CSR address.
pub const MSCRATCH: u32 = 0x340;
/// Machine exception program counter CSR address.
pub const MEPC: u32 = 0x341;
/// Machine cause register CSR address.
pub const MCAUSE: u32 = 0x342;
/// Machine trap value register CSR address.
pub const MTVAL: u32 = 0x343;
/// Machine interrupt pending register CSR address.
pub const MIP: u32 = 0x344;

/// Debug control and status register CSR address.
pub const DCSR: u32 = 0x7B0;
/// Debug program counter CSR address (next PC to execute).
pub const DPC: u32 = 0x7B1;
/// Debug scratch register 0 CSR address.
pub const DSCRATCH0: u32 = 0x7B2;
/// Debug scratch register 1 CSR address.
pub const DSCRATCH1: u32 = 0x7B3;

/// Machine cycle counter CSR address (mirrors the step counter).
pub const MCYCLE: u32 = 0xB00;
/// Machine instructions-retired counter CSR address.
pub const MINSTRET: u32 = 0xB02;
/// User-visible cycle counter.
pub const CYCLE: u32 = 0xC00;
/// User-visible instructions-retired counter.
pub const INSTRET: u32 = 0xC02;

/// Machine interrupt enable bit in `mstatus`.
pub const MSTATUS_MIE: u64 = 1 << 3;
/// Machine previous interrupt enable bit in `mstatus`.
pub const MSTATUS_MPIE: u64 = 1 << 7;
/// Machine previous privilege field in `mstatus`.
pub const MSTATUS_MPP: u64 = 3 << 11;

/// Machine software interrupt enable/pending bit.
pub const MIP_MSIP: u64 = 1 << 3;
/// Machine timer interrupt enable/pending bit.
pub const MIP_MTIP: u64 = 1 << 7;
/// Machine external interrupt enable/pending bit.
pub const MIP_MEIP: u64 = 1 << 11;

/// `dcsr.step`: single-step on resume.
pub const DCSR_STEP: u64 = 1 << 2;
/// `dcsr.ebreakm`: `ebreak` in M-mode enters debug mode.
pub const DCSR_EBREAKM: u64 = 1 << 15;
/// `dcsr.cause` field shift.
pub const DCSR_CAUSE_SHIFT: u64 = 6;
/// `dcsr.cause` field mask (before shifting).
pub const DCSR_CAUSE_MASK: u64 = 0x7;
/// `dcsr.xdebugver` = 4 (external debug support, version 0.13+).
pub const DCSR_XDEBUGVER: u64 = 4 << 28;
/// `dcsr.prv` = 3 (machine mode).
pub const DCSR_PRV_M: u64 = 3;

/// `dcsr.cause` value: `ebreak` executed.
pub const DCSR_CAUSE_EBREAK: u64 = 1;
/// `dcsr.cause` value: trigger (hardware breakpoint) fired.
pub const DCSR_CAUSE_TRIGGER: u64 = 2;
/// `dcsr.cause` value: halt requested by the debugger.
pub const DCSR_CAUSE_HALTREQ: u64 = 3;
/// `dcsr.cause` value: single step completed.
pub const DCSR_CAUSE_STEP: u64 = 4;

/// ISA extension bit for 'C' (compressed).
pub const MISA_EXT_C: u64 = 1 << 2;
/// ISA extension bit for 'I' (base integer).
pub const MISA_EXT_I: u64 = 1 << 8;
/// XLEN=64 encoding in `misa`.
pub const MISA_XLEN_64: u64 = 2 << 62;
/// `misa` value reported by the core: RV64IC.
pub const MISA_DEFAULT: u64 = MISA_XLEN_64 | MISA_EXT_I | MISA_EXT_C;

/// CSR names accepted by the DSU register-name table.
pub const CSR_NAMES: &[(&str, u32)] = &[
    ("mvendorid", MVENDORID),
    ("marchid", MARCHID),
    ("mimpid", MIMPID),
    ("mhartid", MHARTID),
    ("mstatus", MSTATUS),
    ("misa", MISA),
    ("mie", MIE),
    ("mtvec", MTVEC),
    ("mscratch", MSCRATCH),
    ("mepc", MEPC),
    ("mcause", MCAUSE),
    ("mtval", MTVAL),
    ("mip", MIP),
    ("dcsr", DCSR),
    ("dpc", DPC),
    ("dscratch0", DSCRATCH0),
    ("dscratch1", DSCRATCH1),
    ("mcycle", MCYCLE),
    ("minstret", MINSTRET),
    ("cycle", CYCLE),
    ("instret", INSTRET),
];

/// Flat CSR storage indexed by CSR number.
#[derive(Debug, Clone)]
pub struct CsrFile {
    regs: Box<[u64]>,
}

impl Default for CsrFile {
    fn default() -> Self {
        Self {
            regs: vec![0; CSR_COUNT].into_boxed_slice(),
        }
    }
}

impl CsrFile {
    /// Reads the raw slot for `addr`; numbers outside the 12-bit space read as zero.
    pub fn read(&self, addr: u32) -> u64 {
        self.regs.get(addr as usize).copied().unwrap_or(0)
    }

    /// Writes the raw slot for `addr`; numbers outside the 12-bit space are ignored.
    pub fn write(&mut self, addr: u32, val: u64) {
        if let Some(slot) = self.regs.get_mut(addr as usize) {
            *slot = val;
        }
    }

    /// Sets the bits of `mask` in the slot for `addr`.
    pub fn set_bits(&mut self, addr: u32, mask: u64) {
        let v = self.read(addr);
        self.write(addr, v | mask);
    }

    /// Clears the bits of `mask` in the slot for `addr`.
    pub fn clear_bits(&mut self, addr: u32, mask: u64) {
        let v = self.read(addr);
        self.write(addr, v & !mask);
    }
}

/// Returns `true` for CSR numbers in the read-only block (bits 11:10 == 0b11).
pub fn is_read_only(addr: u32) -> bool {
    (addr >> 10) & 0b11 == 0b11
}

/// Looks up a CSR number by name (case-insensitive).
pub fn csr_by_name(name: &str) -> Option<u32> {
    CSR_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, a)| a)
}
