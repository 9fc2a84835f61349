//! Instruction Disassembler.
//!
//! Converts an instruction word into a mnemonic string for trace records and the console's
//! `disas` command. Covers the encodings the decoder accepts; anything else prints as
//! `unknown`.
//!
//! # Usage
//!
//! ```
//! use rvdbg_core::isa::disasm::disassemble;
//! assert_eq!(disassemble(0x00A0_0513), "addi a0, zero, 10");
//! ```

use crate::isa::abi::GPR_NAMES;
use crate::isa::instruction::{InstructionBits, is_compressed};
use crate::isa::privileged::opcodes as sys_op;
use crate::isa::rv64i::{funct3 as i_f3, funct7 as i_f7, opcodes as i_op};

/// Returns the ABI name for an integer register index.
#[inline]
fn xreg(idx: usize) -> &'static str {
    GPR_NAMES.get(idx).copied().unwrap_or("x??")
}

/// Disassembles an instruction word into a human-readable string.
///
/// # Arguments
///
/// * `inst` - The raw instruction word; compressed encodings occupy the low half.
pub fn disassemble(inst: u32) -> String {
    if is_compressed(inst) {
        return if inst as u16 == sys_op::C_EBREAK {
            "c.ebreak".to_string()
        } else {
            format!("unknown ({:#06x})", inst as u16)
        };
    }

    let (rd, rs1, rs2, f3) = (inst.rd(), inst.rs1(), inst.rs2(), inst.funct3());

    match inst.opcode() {
        i_op::OP_REG => disasm_op_reg(rd, rs1, rs2, f3, inst.funct7(), false),
        i_op::OP_REG_32 => disasm_op_reg(rd, rs1, rs2, f3, inst.funct7(), true),
        i_op::OP_IMM => disasm_op_imm(rd, rs1, f3, inst.imm_i(), false),
        i_op::OP_IMM_32 => disasm_op_imm(rd, rs1, f3, inst.imm_i(), true),

        i_op::OP_LOAD => {
            let mn = match f3 {
                i_f3::LB => "lb",
                i_f3::LH => "lh",
                i_f3::LW => "lw",
                i_f3::LD => "ld",
                i_f3::LBU => "lbu",
                i_f3::LHU => "lhu",
                i_f3::LWU => "lwu",
                _ => "l??",
            };
            format!("{mn} {}, {}({})", xreg(rd), inst.imm_i(), xreg(rs1))
        }
        i_op::OP_STORE => {
            let mn = match f3 {
                i_f3::SB => "sb",
                i_f3::SH => "sh",
                i_f3::SW => "sw",
                i_f3::SD => "sd",
                _ => "s??",
            };
            format!("{mn} {}, {}({})", xreg(rs2), inst.imm_s(), xreg(rs1))
        }
        i_op::OP_BRANCH => {
            let mn = match f3 {
                i_f3::BEQ => "beq",
                i_f3::BNE => "bne",
                i_f3::BLT => "blt",
                i_f3::BGE => "bge",
                i_f3::BLTU => "bltu",
                i_f3::BGEU => "bgeu",
                _ => "b??",
            };
            format!("{mn} {}, {}, {}", xreg(rs1), xreg(rs2), inst.imm_b())
        }

        i_op::OP_LUI => format!("lui {}, {:#x}", xreg(rd), inst >> 12),
        i_op::OP_AUIPC => format!("auipc {}, {:#x}", xreg(rd), inst >> 12),
        i_op::OP_JAL => format!("jal {}, {}", xreg(rd), inst.imm_j()),
        i_op::OP_JALR => {
            if rd == 0 && rs1 == 1 && inst.imm_i() == 0 {
                "ret".to_string()
            } else {
                format!("jalr {}, {}({})", xreg(rd), inst.imm_i(), xreg(rs1))
            }
        }

        i_op::OP_MISC_MEM => {
            if f3 == i_f3::FENCE {
                "fence".to_string()
            } else {
                "fence.i".to_string()
            }
        }

        sys_op::OP_SYSTEM => disasm_system(inst, rd, rs1, f3),

        _ => format!("unknown ({inst:#010x})"),
    }
}

fn disasm_op_reg(rd: usize, rs1: usize, rs2: usize, f3: u32, f7: u32, is_w: bool) -> String {
    let suffix = if is_w { "w" } else { "" };
    let mn = match (f3, f7) {
        (i_f3::ADD_SUB, i_f7::DEFAULT) => "add",
        (i_f3::ADD_SUB, i_f7::SUB) => "sub",
        (i_f3::SLL, _) => "sll",
        (i_f3::SLT, _) => "slt",
        (i_f3::SLTU, _) => "sltu",
        (i_f3::XOR, _) => "xor",
        (i_f3::SRL_SRA, i_f7::DEFAULT) => "srl",
        (i_f3::SRL_SRA, i_f7::SUB) => "sra",
        (i_f3::OR, _) => "or",
        (i_f3::AND, _) => "and",
        _ => "r??",
    };
    format!("{mn}{suffix} {}, {}, {}", xreg(rd), xreg(rs1), xreg(rs2))
}

fn disasm_op_imm(rd: usize, rs1: usize, f3: u32, imm: i64, is_w: bool) -> String {
    let suffix = if is_w { "w" } else { "" };
    let shamt = imm & 0x3F;
    let mn = match f3 {
        i_f3::ADD_SUB => "addi",
        i_f3::SLT => "slti",
        i_f3::SLTU => "sltiu",
        i_f3::XOR => "xori",
        i_f3::OR => "ori",
        i_f3::AND => "andi",
        i_f3::SLL => return format!("slli{suffix} {}, {}, {shamt}", xreg(rd), xreg(rs1)),
        i_f3::SRL_SRA => {
            let mn = if (imm >> 10) & 1 != 0 { "srai" } else { "srli" };
            return format!("{mn}{suffix} {}, {}, {shamt}", xreg(rd), xreg(rs1));
        }
        _ => "i??",
    };
    format!("{mn}{suffix} {}, {}, {imm}", xreg(rd), xreg(rs1))
}

fn disasm_system(inst: u32, rd: usize, rs1: usize, f3: u32) -> String {
    match inst {
        sys_op::ECALL => return "ecall".to_string(),
        sys_op::EBREAK => return "ebreak".to_string(),
        sys_op::MRET => return "mret".to_string(),
        sys_op::WFI => return "wfi".to_string(),
        _ => {}
    }

    let csr = inst.csr();
    let mn = match f3 {
        sys_op::CSRRW => "csrrw",
        sys_op::CSRRS => "csrrs",
        sys_op::CSRRC => "csrrc",
        sys_op::CSRRWI => return format!("csrrwi {}, {csr:#05x}, {rs1}", xreg(rd)),
        sys_op::CSRRSI => return format!("csrrsi {}, {csr:#05x}, {rs1}", xreg(rd)),
        sys_op::CSRRCI => return format!("csrrci {}, {csr:#05x}, {rs1}", xreg(rd)),
        _ => return format!("system?? ({inst:#010x})"),
    };
    format!("{mn} {}, {csr:#05x}, {}", xreg(rd), xreg(rs1))
}
