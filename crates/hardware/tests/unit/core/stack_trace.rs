use pretty_assertions::assert_eq;
use rvdbg_core::common::constants::{STACK_TRACE_BUF_INDEX, STACK_TRACE_CNT_INDEX};
use rvdbg_core::debug::dsu::region;
use rvdbg_core::isa::abi::REG_RA;

use crate::common::builder::{InstructionBuilder, spin};
use crate::common::harness::{RAM_BASE, TestContext};

fn call_and_return() -> Vec<u32> {
    vec![
        InstructionBuilder::new().jal(REG_RA as u32, 8).build(),
        spin(),
        InstructionBuilder::new().jalr(0, REG_RA as u32, 0).build(),
    ]
}

#[test]
fn call_pushes_and_return_pops() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &call_and_return())
        .power_on();

    let _ = ctx.run(1);
    assert_eq!(ctx.cpu.stack_trace_count(), 1);
    assert_eq!(ctx.cpu.stack_trace(), &[(RAM_BASE, RAM_BASE + 8)]);
    assert_eq!(ctx.get_reg(REG_RA), RAM_BASE + 4);

    let _ = ctx.run(1);
    assert_eq!(ctx.cpu.stack_trace_count(), 0);
    assert_eq!(ctx.cpu.npc(), RAM_BASE + 4);
}

#[test]
fn trace_is_visible_through_the_register_region() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &call_and_return())
        .power_on();
    let _ = ctx.run(1);
    ctx.cpu.halt(None).unwrap();

    assert_eq!(ctx.read(region::REGS, STACK_TRACE_CNT_INDEX), 1);
    assert_eq!(ctx.read(region::REGS, STACK_TRACE_BUF_INDEX), RAM_BASE);
    assert_eq!(ctx.read(region::REGS, STACK_TRACE_BUF_INDEX + 1), RAM_BASE + 8);

    ctx.write(region::REGS, STACK_TRACE_CNT_INDEX, 0);
    assert_eq!(ctx.cpu.stack_trace_count(), 0);
    ctx.write(region::REGS, STACK_TRACE_BUF_INDEX, 0x1234);
    assert_eq!(ctx.read(region::REGS, STACK_TRACE_BUF_INDEX), RAM_BASE);
}

#[test]
fn overflow_drops_entries_but_keeps_counting() {
    let mut ctx = TestContext::with_config(|c| c.stack_trace_size = 2);
    for i in 0..5 {
        ctx.cpu.push_stack_trace(0x100 + i, 0x200 + i);
    }
    assert_eq!(ctx.cpu.stack_trace_count(), 5);
    assert_eq!(ctx.cpu.stack_trace_capacity(), 2);
    assert_eq!(ctx.cpu.stack_trace(), &[(0x100, 0x200), (0x101, 0x201)]);

    for _ in 0..4 {
        ctx.cpu.pop_stack_trace();
    }
    ctx.cpu.push_stack_trace(0x300, 0x400);
    assert_eq!(ctx.cpu.stack_trace(), &[(0x100, 0x200), (0x300, 0x400)]);
}

#[test]
fn count_written_at_its_maximum_saturates_on_call() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &call_and_return())
        .power_on();
    ctx.cpu.halt(None).unwrap();
    ctx.write(region::REGS, STACK_TRACE_CNT_INDEX, u64::MAX);
    ctx.cpu.go().unwrap();

    let _ = ctx.run(1);

    assert_eq!(ctx.cpu.stack_trace_count(), u64::MAX);
    assert_eq!(ctx.cpu.stack_trace().len(), ctx.cpu.stack_trace_capacity());
    assert_eq!(ctx.cpu.npc(), RAM_BASE + 8);
}
