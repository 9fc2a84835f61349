//! Instruction encoding utilities and the execution contract.
//!
//! This module provides:
//! 1. **Field Extraction:** `InstructionBits`, pulling register, function-code and immediate
//!    fields out of a 32-bit encoding.
//! 2. **Execution Contract:** `Instruction`, the object the decoder hands to the core. The core
//!    never interprets an encoding itself; it asks the instruction to execute and gets back
//!    the number of bytes consumed.

use crate::core::Cpu;

/// Bit mask for extracting the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;
/// Bit mask for a 5-bit register field.
pub const REG_MASK: u32 = 0x1F;
/// Bit mask for extracting the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;
/// Bit mask for extracting the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;
/// Bit mask for extracting the CSR address field (bits 20-31).
pub const CSR_MASK: u32 = 0xFFF;
/// Bit mask for the U-type immediate (bits 12-31).
pub const U_IMM_MASK: u32 = 0xFFFF_F000;

/// Low two bits of every 32-bit encoding; anything else is a 16-bit compressed encoding.
pub const FULL_SIZE_MARKER: u32 = 0b11;

/// Returns `true` when the low half-word starts a compressed (16-bit) instruction.
#[inline]
pub fn is_compressed(raw: u32) -> bool {
    raw & FULL_SIZE_MARKER != FULL_SIZE_MARKER
}

/// Sign-extends the low `bits` bits of `val`.
#[inline]
fn sign_extend(val: u32, bits: u32) -> i64 {
    let shift = 32 - bits;
    i64::from(((val << shift) as i32) >> shift)
}

/// Field accessors for a 32-bit instruction encoding.
pub trait InstructionBits {
    /// Opcode field (bits 0-6).
    fn opcode(&self) -> u32;
    /// Destination register (bits 7-11).
    fn rd(&self) -> usize;
    /// First source register (bits 15-19).
    fn rs1(&self) -> usize;
    /// Second source register (bits 20-24).
    fn rs2(&self) -> usize;
    /// Minor opcode (bits 12-14).
    fn funct3(&self) -> u32;
    /// R-type function code (bits 25-31).
    fn funct7(&self) -> u32;
    /// CSR number (bits 20-31).
    fn csr(&self) -> u32;
    /// Sign-extended I-type immediate.
    fn imm_i(&self) -> i64;
    /// Sign-extended S-type immediate.
    fn imm_s(&self) -> i64;
    /// Sign-extended B-type immediate (even byte offset).
    fn imm_b(&self) -> i64;
    /// U-type immediate, already shifted into bits 12-31 and sign-extended.
    fn imm_u(&self) -> i64;
    /// Sign-extended J-type immediate (even byte offset).
    fn imm_j(&self) -> i64;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & OPCODE_MASK
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & REG_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }

    #[inline(always)]
    fn csr(&self) -> u32 {
        (self >> 20) & CSR_MASK
    }

    fn imm_i(&self) -> i64 {
        i64::from((*self as i32) >> 20)
    }

    fn imm_s(&self) -> i64 {
        let low = (self >> 7) & 0x1F;
        let high = (self >> 25) & 0x7F;
        sign_extend((high << 5) | low, 12)
    }

    fn imm_b(&self) -> i64 {
        let bit_11 = (self >> 7) & 1;
        let bits_4_1 = (self >> 8) & 0xF;
        let bits_10_5 = (self >> 25) & 0x3F;
        let bit_12 = (self >> 31) & 1;
        sign_extend(
            (bit_12 << 12) | (bit_11 << 11) | (bits_10_5 << 5) | (bits_4_1 << 1),
            13,
        )
    }

    fn imm_u(&self) -> i64 {
        i64::from((self & U_IMM_MASK) as i32)
    }

    fn imm_j(&self) -> i64 {
        let bits_19_12 = (self >> 12) & 0xFF;
        let bit_11 = (self >> 20) & 1;
        let bits_10_1 = (self >> 21) & 0x3FF;
        let bit_20 = (self >> 31) & 1;
        sign_extend(
            (bit_20 << 20) | (bits_19_12 << 12) | (bit_11 << 11) | (bits_10_1 << 1),
            21,
        )
    }
}

/// A decoded instruction that can execute against the core.
///
/// Implementations are stateless singletons; the decoder returns `&'static` references so the
/// core can hold one across the mutable borrow needed by `exec`.
pub trait Instruction: Sync {
    /// Lower-case mnemonic.
    fn name(&self) -> &'static str;

    /// Executes `raw` on `cpu` and returns the instruction length in bytes.
    ///
    /// Control transfers go through `Cpu::set_branch`; faults through `Cpu::raise_exception`.
    /// The returned length is still the encoded size when a fault is raised.
    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32;
}

impl std::fmt::Debug for dyn Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
