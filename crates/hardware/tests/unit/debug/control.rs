use pretty_assertions::assert_eq;
use rvdbg_core::RunState;
use rvdbg_core::core::arch::csr;
use rvdbg_core::debug::dsu::{control, region};
use rvdbg_core::debug::regs::DsuControl;

use crate::common::builder::{EBREAK, NOP, inc, spin};
use crate::common::harness::{RAM_BASE, TestContext};

fn control_word(halt: bool, stepping: bool) -> u64 {
    let mut reg = DsuControl(0);
    reg.set_halt(halt);
    reg.set_stepping(stepping);
    reg.0
}

#[test]
fn control_register_round_trip() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[inc(1), inc(1), inc(1), spin()])
        .power_on();

    ctx.write(region::CONTROL, control::CONTROL, control_word(true, false));
    assert_eq!(ctx.cpu.state(), RunState::Halted);
    let status = DsuControl(ctx.read(region::CONTROL, control::CONTROL));
    assert!(status.halt());
    assert!(!status.breakpoint());

    ctx.write(region::CONTROL, control::CONTROL, control_word(false, true));
    assert_eq!(ctx.cpu.state(), RunState::Stepping);

    ctx.write(region::CONTROL, control::CONTROL, 0);
    assert_eq!(ctx.cpu.state(), RunState::Normal);
    let status = DsuControl(ctx.read(region::CONTROL, control::CONTROL));
    assert!(!status.halt());
    assert_eq!(status.core_id(), 0);
}

#[test]
fn halt_bit_wins_over_stepping_bit() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    ctx.write(region::CONTROL, control::CONTROL, control_word(true, true));
    assert_eq!(ctx.cpu.state(), RunState::Halted);
}

#[test]
fn control_write_to_an_off_core_changes_nothing() {
    let mut ctx = TestContext::new();
    ctx.write(region::CONTROL, control::CONTROL, 0);
    assert_eq!(ctx.cpu.state(), RunState::Off);
}

#[test]
fn breakpoint_bit_reads_back_the_hit_flag() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[EBREAK, spin()])
        .power_on();
    let _ = ctx.run(1);
    let status = DsuControl(ctx.read(region::CONTROL, control::CONTROL));
    assert!(status.halt());
    assert!(status.breakpoint());
}

#[test]
fn stepping_count_and_counters() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[NOP, NOP, NOP, NOP, spin()])
        .halted();

    ctx.write(region::CONTROL, control::STEPPING_MODE_STEPS, 3);
    assert_eq!(ctx.read(region::CONTROL, control::STEPPING_MODE_STEPS), 3);
    assert_eq!(ctx.cpu.stepping_count(), 3);

    ctx.cpu.step().unwrap();
    let _ = ctx.run(10);
    assert_eq!(ctx.read(region::CONTROL, control::CLOCK_CNT), 3);
    assert_eq!(ctx.read(region::CONTROL, control::EXECUTED_CNT), 3);

    // Counters are read-only through the control region.
    ctx.write(region::CONTROL, control::CLOCK_CNT, 0);
    assert_eq!(ctx.cpu.step_count(), 3);
}

#[test]
fn breakpoints_through_the_control_region() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[NOP, NOP, spin()])
        .halted();
    let a = RAM_BASE + 4;

    ctx.write(region::CONTROL, control::ADD_BREAKPOINT, a);
    assert!(ctx.cpu.breakpoints().contains(a));
    assert_eq!(ctx.peek32(a), EBREAK);

    ctx.write(region::CONTROL, control::REMOVE_BREAKPOINT, a);
    assert!(!ctx.cpu.breakpoints().contains(a));
    assert_eq!(ctx.peek32(a), NOP);

    ctx.write(region::CONTROL, control::ADD_HW_BREAKPOINT, a);
    assert!(ctx.cpu.breakpoints().is_hardware(a));

    // Unmapped software breakpoints are refused without disturbing the core.
    ctx.write(region::CONTROL, control::ADD_BREAKPOINT, 0x2000_0000);
    assert!(!ctx.cpu.breakpoints().contains(0x2000_0000));
    assert_eq!(ctx.cpu.state(), RunState::Halted);
}

#[test]
fn br_ctrl_round_trip() {
    let mut ctx = TestContext::new().halted();
    ctx.write(region::CONTROL, control::BR_CTRL, 1);
    assert_eq!(ctx.read(region::CONTROL, control::BR_CTRL), 1);
    assert!(ctx.cpu.trap_on_break());
}

#[test]
fn csr_region_goes_through_side_effects() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .halted();

    ctx.write(region::CSR, u64::from(csr::MSCRATCH), 0x55);
    assert_eq!(ctx.cpu.read_csr(csr::MSCRATCH), 0x55);

    ctx.write(region::CSR, u64::from(csr::DPC), RAM_BASE + 0x40);
    assert_eq!(ctx.cpu.npc(), RAM_BASE + 0x40);

    let misa = ctx.read(region::CSR, u64::from(csr::MISA));
    ctx.write(region::CSR, u64::from(csr::MISA), 0);
    assert_eq!(ctx.read(region::CSR, u64::from(csr::MISA)), misa);

    assert_eq!(ctx.read(region::CSR, 0x1000), 0);
}

#[test]
fn register_region_mirrors_gprs_and_fprs() {
    let mut ctx = TestContext::new().halted();

    ctx.write(region::REGS, 10, 0x1234);
    assert_eq!(ctx.get_reg(10), 0x1234);
    ctx.write(region::REGS, 0, 0x1234);
    assert_eq!(ctx.read(region::REGS, 0), 0);

    ctx.write(region::REGS, 32 + 3, 0x4009_21fb_5444_2d18);
    assert_eq!(ctx.cpu.read_fpr(3), 0x4009_21fb_5444_2d18);
    assert_eq!(ctx.read(region::REGS, 35), 0x4009_21fb_5444_2d18);

    assert_eq!(ctx.read(region::REGS, 100), 0);
}
