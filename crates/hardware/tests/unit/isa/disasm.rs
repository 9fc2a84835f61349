use pretty_assertions::assert_eq;
use rstest::rstest;
use rvdbg_core::isa::disasm::disassemble;

use crate::common::builder::{EBREAK, ECALL, InstructionBuilder, MRET, NOP, spin};

#[rstest]
#[case(NOP, "addi zero, zero, 0")]
#[case(InstructionBuilder::new().add(10, 11, 12).build(), "add a0, a1, a2")]
#[case(InstructionBuilder::new().sub(5, 6, 7).build(), "sub t0, t1, t2")]
#[case(InstructionBuilder::new().addi(2, 2, -16).build(), "addi sp, sp, -16")]
#[case(InstructionBuilder::new().ld(10, 2, 8).build(), "ld a0, 8(sp)")]
#[case(InstructionBuilder::new().sb(10, 11, -1).build(), "sb a1, -1(a0)")]
#[case(InstructionBuilder::new().beq(10, 0, -4).build(), "beq a0, zero, -4")]
#[case(InstructionBuilder::new().lui(5, 0x10000).build(), "lui t0, 0x10000")]
#[case(InstructionBuilder::new().jal(1, 2048).build(), "jal ra, 2048")]
#[case(InstructionBuilder::new().jalr(0, 1, 0).build(), "ret")]
#[case(InstructionBuilder::new().csrrw(0, 0x305, 10).build(), "csrrw zero, 0x305, a0")]
#[case(spin(), "jal zero, 0")]
#[case(ECALL, "ecall")]
#[case(EBREAK, "ebreak")]
#[case(MRET, "mret")]
#[case(0x0000_4501, "unknown (0x4501)")]
#[case(0x0000_007F, "unknown (0x0000007f)")]
fn mnemonics(#[case] raw: u32, #[case] text: &str) {
    assert_eq!(disassemble(raw), text);
}
