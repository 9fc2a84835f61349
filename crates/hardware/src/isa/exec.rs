//! Executable instruction objects for the RV64I base set, Zicsr and the machine-mode
//! system instructions.
//!
//! Each object covers one major opcode (or one fixed system encoding) and dispatches on the
//! minor function codes itself. Encodings a group does not recognize raise an illegal
//! instruction trap from `exec`; opcodes no group covers are rejected earlier, by the decoder.

use crate::common::Trap;
use crate::core::Cpu;
use crate::core::arch::csr;
use crate::isa::abi::{REG_RA, REG_T0, REG_ZERO};
use crate::isa::instruction::{Instruction, InstructionBits};
use crate::isa::privileged::opcodes as sys_op;
use crate::isa::rv64i::{funct3, funct7};

const LEN32: u32 = 4;
const LEN16: u32 = 2;

fn is_link(reg: usize) -> bool {
    reg == REG_RA || reg == REG_T0
}

fn illegal(cpu: &mut Cpu, raw: u32) -> u32 {
    cpu.raise_exception(Trap::IllegalInstruction(raw));
    LEN32
}

/// `lui rd, imm`
#[derive(Debug)]
pub struct Lui;

impl Instruction for Lui {
    fn name(&self) -> &'static str {
        "lui"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        cpu.write_gpr(raw.rd(), raw.imm_u() as u64);
        LEN32
    }
}

/// `auipc rd, imm`
#[derive(Debug)]
pub struct Auipc;

impl Instruction for Auipc {
    fn name(&self) -> &'static str {
        "auipc"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let val = cpu.pc().wrapping_add(raw.imm_u() as u64);
        cpu.write_gpr(raw.rd(), val);
        LEN32
    }
}

/// `jal rd, offset`; a call when `rd` is a link register.
#[derive(Debug)]
pub struct Jal;

impl Instruction for Jal {
    fn name(&self) -> &'static str {
        "jal"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let pc = cpu.pc();
        let target = pc.wrapping_add(raw.imm_j() as u64);
        if cpu.set_branch(target) {
            cpu.write_gpr(raw.rd(), pc.wrapping_add(u64::from(LEN32)));
            if is_link(raw.rd()) {
                cpu.push_stack_trace(pc, target);
            }
        }
        LEN32
    }
}

/// `jalr rd, offset(rs1)`; a call when `rd` is a link register, a return for `ret`.
#[derive(Debug)]
pub struct Jalr;

impl Instruction for Jalr {
    fn name(&self) -> &'static str {
        "jalr"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        if raw.funct3() != 0 {
            return illegal(cpu, raw);
        }
        let pc = cpu.pc();
        let target = cpu.read_gpr(raw.rs1()).wrapping_add(raw.imm_i() as u64) & !1;
        if cpu.set_branch(target) {
            let (rd, rs1) = (raw.rd(), raw.rs1());
            cpu.write_gpr(rd, pc.wrapping_add(u64::from(LEN32)));
            if is_link(rd) {
                cpu.push_stack_trace(pc, target);
            } else if rd == REG_ZERO && is_link(rs1) {
                cpu.pop_stack_trace();
            }
        }
        LEN32
    }
}

/// Conditional branches.
#[derive(Debug)]
pub struct Branch;

impl Instruction for Branch {
    fn name(&self) -> &'static str {
        "branch"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let a = cpu.read_gpr(raw.rs1());
        let b = cpu.read_gpr(raw.rs2());
        let taken = match raw.funct3() {
            funct3::BEQ => a == b,
            funct3::BNE => a != b,
            funct3::BLT => (a as i64) < (b as i64),
            funct3::BGE => (a as i64) >= (b as i64),
            funct3::BLTU => a < b,
            funct3::BGEU => a >= b,
            _ => return illegal(cpu, raw),
        };
        if taken {
            let _ = cpu.set_branch(cpu.pc().wrapping_add(raw.imm_b() as u64));
        }
        LEN32
    }
}

/// Integer loads.
#[derive(Debug)]
pub struct Load;

impl Instruction for Load {
    fn name(&self) -> &'static str {
        "load"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let (size, signed) = match raw.funct3() {
            funct3::LB => (1, true),
            funct3::LH => (2, true),
            funct3::LW => (4, true),
            funct3::LD => (8, false),
            funct3::LBU => (1, false),
            funct3::LHU => (2, false),
            funct3::LWU => (4, false),
            _ => return illegal(cpu, raw),
        };
        let addr = cpu.read_gpr(raw.rs1()).wrapping_add(raw.imm_i() as u64);
        if let Some(val) = cpu.load(addr, size) {
            let val = if signed {
                let shift = 64 - 8 * size as u32;
                (((val << shift) as i64) >> shift) as u64
            } else {
                val
            };
            cpu.write_gpr(raw.rd(), val);
        }
        LEN32
    }
}

/// Integer stores.
#[derive(Debug)]
pub struct Store;

impl Instruction for Store {
    fn name(&self) -> &'static str {
        "store"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let size = match raw.funct3() {
            funct3::SB => 1,
            funct3::SH => 2,
            funct3::SW => 4,
            funct3::SD => 8,
            _ => return illegal(cpu, raw),
        };
        let addr = cpu.read_gpr(raw.rs1()).wrapping_add(raw.imm_s() as u64);
        cpu.store(addr, size, cpu.read_gpr(raw.rs2()));
        LEN32
    }
}

fn alu(f3: u32, alt: bool, a: u64, b: u64) -> Option<u64> {
    let shamt = (b & 0x3F) as u32;
    Some(match (f3, alt) {
        (funct3::ADD_SUB, false) => a.wrapping_add(b),
        (funct3::ADD_SUB, true) => a.wrapping_sub(b),
        (funct3::SLL, false) => a << shamt,
        (funct3::SLT, false) => u64::from((a as i64) < (b as i64)),
        (funct3::SLTU, false) => u64::from(a < b),
        (funct3::XOR, false) => a ^ b,
        (funct3::SRL_SRA, false) => a >> shamt,
        (funct3::SRL_SRA, true) => ((a as i64) >> shamt) as u64,
        (funct3::OR, false) => a | b,
        (funct3::AND, false) => a & b,
        _ => return None,
    })
}

fn alu_w(f3: u32, alt: bool, a: u64, b: u64) -> Option<u64> {
    let (a, b) = (a as u32, b as u32);
    let shamt = b & 0x1F;
    let r = match (f3, alt) {
        (funct3::ADD_SUB, false) => a.wrapping_add(b),
        (funct3::ADD_SUB, true) => a.wrapping_sub(b),
        (funct3::SLL, false) => a << shamt,
        (funct3::SRL_SRA, false) => a >> shamt,
        (funct3::SRL_SRA, true) => ((a as i32) >> shamt) as u32,
        _ => return None,
    };
    Some(i64::from(r as i32) as u64)
}

/// Register-immediate arithmetic (`addi`, `slli`, `srai`, ...).
#[derive(Debug)]
pub struct OpImm;

impl Instruction for OpImm {
    fn name(&self) -> &'static str {
        "op-imm"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let f3 = raw.funct3();
        let imm = raw.imm_i() as u64;
        // Shifts carry a 6-bit shamt; the remaining upper bits select logical or arithmetic.
        let alt = match f3 {
            funct3::SLL => {
                if raw >> 26 != 0 {
                    return illegal(cpu, raw);
                }
                false
            }
            funct3::SRL_SRA => match raw >> 26 {
                0 => false,
                0b01_0000 => true,
                _ => return illegal(cpu, raw),
            },
            _ => false,
        };
        match alu(f3, alt, cpu.read_gpr(raw.rs1()), imm) {
            Some(v) => cpu.write_gpr(raw.rd(), v),
            None => return illegal(cpu, raw),
        }
        LEN32
    }
}

/// 32-bit register-immediate arithmetic (`addiw`, `slliw`, ...).
#[derive(Debug)]
pub struct OpImm32;

impl Instruction for OpImm32 {
    fn name(&self) -> &'static str {
        "op-imm-32"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let f3 = raw.funct3();
        let alt = match (f3, raw.funct7()) {
            (funct3::ADD_SUB, _) => false,
            (funct3::SLL | funct3::SRL_SRA, funct7::DEFAULT) => false,
            (funct3::SRL_SRA, funct7::SUB) => true,
            _ => return illegal(cpu, raw),
        };
        match alu_w(f3, alt, cpu.read_gpr(raw.rs1()), raw.imm_i() as u64) {
            Some(v) => cpu.write_gpr(raw.rd(), v),
            None => return illegal(cpu, raw),
        }
        LEN32
    }
}

/// Register-register arithmetic.
#[derive(Debug)]
pub struct Op;

impl Instruction for Op {
    fn name(&self) -> &'static str {
        "op"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let alt = match raw.funct7() {
            funct7::DEFAULT => false,
            funct7::SUB => true,
            _ => return illegal(cpu, raw),
        };
        let a = cpu.read_gpr(raw.rs1());
        let b = cpu.read_gpr(raw.rs2());
        match alu(raw.funct3(), alt, a, b) {
            Some(v) => cpu.write_gpr(raw.rd(), v),
            None => return illegal(cpu, raw),
        }
        LEN32
    }
}

/// 32-bit register-register arithmetic.
#[derive(Debug)]
pub struct Op32;

impl Instruction for Op32 {
    fn name(&self) -> &'static str {
        "op-32"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let alt = match raw.funct7() {
            funct7::DEFAULT => false,
            funct7::SUB => true,
            _ => return illegal(cpu, raw),
        };
        let a = cpu.read_gpr(raw.rs1());
        let b = cpu.read_gpr(raw.rs2());
        match alu_w(raw.funct3(), alt, a, b) {
            Some(v) => cpu.write_gpr(raw.rd(), v),
            None => return illegal(cpu, raw),
        }
        LEN32
    }
}

/// `fence` and `fence.i`; memory is coherent, so both retire without effect.
#[derive(Debug)]
pub struct Fence;

impl Instruction for Fence {
    fn name(&self) -> &'static str {
        "fence"
    }

    fn exec(&self, _cpu: &mut Cpu, _raw: u32) -> u32 {
        LEN32
    }
}

/// `ecall`
#[derive(Debug)]
pub struct Ecall;

impl Instruction for Ecall {
    fn name(&self) -> &'static str {
        "ecall"
    }

    fn exec(&self, cpu: &mut Cpu, _raw: u32) -> u32 {
        cpu.raise_exception(Trap::EnvironmentCallFromMMode);
        LEN32
    }
}

/// `ebreak`
#[derive(Debug)]
pub struct Ebreak;

impl Instruction for Ebreak {
    fn name(&self) -> &'static str {
        "ebreak"
    }

    fn exec(&self, cpu: &mut Cpu, _raw: u32) -> u32 {
        cpu.ebreak(LEN32);
        LEN32
    }
}

/// `c.ebreak`
#[derive(Debug)]
pub struct CEbreak;

impl Instruction for CEbreak {
    fn name(&self) -> &'static str {
        "c.ebreak"
    }

    fn exec(&self, cpu: &mut Cpu, _raw: u32) -> u32 {
        cpu.ebreak(LEN16);
        LEN16
    }
}

/// `mret`
#[derive(Debug)]
pub struct Mret;

impl Instruction for Mret {
    fn name(&self) -> &'static str {
        "mret"
    }

    fn exec(&self, cpu: &mut Cpu, _raw: u32) -> u32 {
        cpu.mret();
        LEN32
    }
}

/// `wfi`; retires as a no-op since interrupts are sampled every step anyway.
#[derive(Debug)]
pub struct Wfi;

impl Instruction for Wfi {
    fn name(&self) -> &'static str {
        "wfi"
    }

    fn exec(&self, _cpu: &mut Cpu, _raw: u32) -> u32 {
        LEN32
    }
}

/// Zicsr read-modify-write instructions.
#[derive(Debug)]
pub struct CsrAccess;

impl Instruction for CsrAccess {
    fn name(&self) -> &'static str {
        "csr"
    }

    fn exec(&self, cpu: &mut Cpu, raw: u32) -> u32 {
        let addr = raw.csr();
        let (rd, rs1) = (raw.rd(), raw.rs1());
        let src = match raw.funct3() {
            sys_op::CSRRW | sys_op::CSRRS | sys_op::CSRRC => cpu.read_gpr(rs1),
            sys_op::CSRRWI | sys_op::CSRRSI | sys_op::CSRRCI => rs1 as u64,
            _ => return illegal(cpu, raw),
        };
        let writes = match raw.funct3() {
            sys_op::CSRRW | sys_op::CSRRWI => true,
            _ => rs1 != 0,
        };
        if writes && csr::is_read_only(addr) {
            return illegal(cpu, raw);
        }
        let old = cpu.read_csr(addr);
        if writes {
            let new = match raw.funct3() {
                sys_op::CSRRW | sys_op::CSRRWI => src,
                sys_op::CSRRS | sys_op::CSRRSI => old | src,
                _ => old & !src,
            };
            cpu.write_csr(addr, new);
        }
        cpu.write_gpr(rd, old);
        LEN32
    }
}

/// `lui` singleton.
pub static LUI: Lui = Lui;
/// `auipc` singleton.
pub static AUIPC: Auipc = Auipc;
/// `jal` singleton.
pub static JAL: Jal = Jal;
/// `jalr` singleton.
pub static JALR: Jalr = Jalr;
/// Branch singleton.
pub static BRANCH: Branch = Branch;
/// Load singleton.
pub static LOAD: Load = Load;
/// Store singleton.
pub static STORE: Store = Store;
/// OP-IMM singleton.
pub static OP_IMM: OpImm = OpImm;
/// OP-IMM-32 singleton.
pub static OP_IMM_32: OpImm32 = OpImm32;
/// OP singleton.
pub static OP: Op = Op;
/// OP-32 singleton.
pub static OP_32: Op32 = Op32;
/// Fence singleton.
pub static FENCE: Fence = Fence;
/// `ecall` singleton.
pub static ECALL: Ecall = Ecall;
/// `ebreak` singleton.
pub static EBREAK: Ebreak = Ebreak;
/// `c.ebreak` singleton.
pub static C_EBREAK: CEbreak = CEbreak;
/// `mret` singleton.
pub static MRET: Mret = Mret;
/// `wfi` singleton.
pub static WFI: Wfi = Wfi;
/// Zicsr singleton.
pub static CSR: CsrAccess = CsrAccess;
