use pretty_assertions::assert_eq;
use rstest::rstest;
use rvdbg_core::RunState;
use rvdbg_core::core::arch::csr;

use crate::common::builder::{inc, spin};
use crate::common::harness::{RAM_BASE, TestContext};

/// A core halted after `steps` slots of a spin loop.
fn halted_at(steps: u64, stepping_count: u64) -> TestContext {
    let mut ctx = TestContext::with_config(|c| c.stepping_count = stepping_count)
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    assert_eq!(ctx.run(steps), steps);
    ctx.cpu.halt(None).unwrap();
    ctx
}

#[test]
fn step_executes_exactly_the_stepping_count() {
    let mut ctx = halted_at(100, 5);
    assert_eq!(ctx.cpu.step_count(), 100);

    ctx.cpu.step().unwrap();
    assert_eq!(ctx.cpu.state(), RunState::Stepping);
    assert_eq!(ctx.cpu.step_budget(), 105);

    let mut consumed = 0;
    while ctx.cpu.state() == RunState::Stepping {
        if ctx.cpu.update_pipeline() {
            consumed += 1;
        }
        if ctx.cpu.step_count() < 105 {
            assert_eq!(ctx.cpu.state(), RunState::Stepping);
        }
    }

    assert_eq!(consumed, 5);
    assert_eq!(ctx.cpu.step_count(), 105);
    assert_eq!(ctx.cpu.state(), RunState::Halted);
    assert!(
        ctx.cpu
            .last_halt_message()
            .ends_with("Stepping breakpoint")
    );
    let cause = (ctx.cpu.read_csr(csr::DCSR) >> csr::DCSR_CAUSE_SHIFT) & csr::DCSR_CAUSE_MASK;
    assert_eq!(cause, csr::DCSR_CAUSE_STEP);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(8)]
fn step_by_overrides_stepping_count(#[case] count: u64) {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[inc(5), inc(5), inc(5), inc(5), inc(5), inc(5), inc(5), inc(5), spin()])
        .halted();

    ctx.cpu.step_by(count).unwrap();
    let consumed = ctx.run(count + 5);

    assert_eq!(consumed, count);
    assert_eq!(ctx.get_reg(5), count);
    assert_eq!(ctx.cpu.state(), RunState::Halted);
}

#[test]
fn zero_step_halts_without_consuming() {
    let mut ctx = halted_at(4, 1);
    ctx.cpu.step_by(0).unwrap();
    assert!(!ctx.cpu.update_pipeline());
    assert_eq!(ctx.cpu.state(), RunState::Halted);
    assert_eq!(ctx.cpu.step_count(), 4);
}

#[test]
fn halt_while_stepping_wins() {
    let mut ctx = halted_at(2, 10);
    ctx.cpu.step().unwrap();
    let _ = ctx.run(3);
    ctx.cpu.halt(None).unwrap();
    assert_eq!(ctx.run(10), 0);
    assert_eq!(ctx.cpu.step_count(), 5);
}

#[test]
fn go_from_stepping_free_runs() {
    let mut ctx = halted_at(0, 2);
    ctx.cpu.step().unwrap();
    ctx.cpu.go().unwrap();
    assert_eq!(ctx.run(10), 10);
    assert_eq!(ctx.cpu.state(), RunState::Normal);
}
