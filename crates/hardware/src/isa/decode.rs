//! RISC-V Instruction Decoder.
//!
//! Maps a fetched instruction word to the executable object that implements it. Only the low
//! half-word is meaningful for compressed encodings; the only compressed instruction the core
//! recognizes is `c.ebreak`, which the debugger injects over compressed code.

use crate::isa::exec;
use crate::isa::instruction::{Instruction, InstructionBits, is_compressed};
use crate::isa::privileged::opcodes as sys_op;
use crate::isa::rv64i::opcodes;

/// Decodes `raw` into an instruction object, or `None` for an encoding the core does not
/// implement.
///
/// # Arguments
///
/// * `raw` - The fetched instruction word, little-endian, compressed encodings in the low half.
///
/// # Returns
///
/// A `'static` instruction object; `None` routes the core onto the illegal-opcode path.
pub fn decode(raw: u32) -> Option<&'static dyn Instruction> {
    if is_compressed(raw) {
        return (raw as u16 == sys_op::C_EBREAK).then_some(&exec::C_EBREAK as &dyn Instruction);
    }

    let inst: &'static dyn Instruction = match raw.opcode() {
        opcodes::OP_LUI => &exec::LUI,
        opcodes::OP_AUIPC => &exec::AUIPC,
        opcodes::OP_JAL => &exec::JAL,
        opcodes::OP_JALR => &exec::JALR,
        opcodes::OP_BRANCH => &exec::BRANCH,
        opcodes::OP_LOAD => &exec::LOAD,
        opcodes::OP_STORE => &exec::STORE,
        opcodes::OP_IMM => &exec::OP_IMM,
        opcodes::OP_IMM_32 => &exec::OP_IMM_32,
        opcodes::OP_REG => &exec::OP,
        opcodes::OP_REG_32 => &exec::OP_32,
        opcodes::OP_MISC_MEM => &exec::FENCE,
        sys_op::OP_SYSTEM => return decode_system(raw),
        _ => return None,
    };
    Some(inst)
}

fn decode_system(raw: u32) -> Option<&'static dyn Instruction> {
    if raw.funct3() != sys_op::PRIV {
        return Some(&exec::CSR);
    }
    let inst: &'static dyn Instruction = match raw {
        sys_op::ECALL => &exec::ECALL,
        sys_op::EBREAK => &exec::EBREAK,
        sys_op::MRET => &exec::MRET,
        sys_op::WFI => &exec::WFI,
        _ => return None,
    };
    Some(inst)
}

/// Returns the encoded length in bytes of the instruction starting with `raw`.
pub fn instruction_length(raw: u32) -> u32 {
    if is_compressed(raw) { 2 } else { 4 }
}
