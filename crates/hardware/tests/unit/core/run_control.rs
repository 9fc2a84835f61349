use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvdbg_core::common::ControlError;
use rvdbg_core::core::arch::csr;
use rvdbg_core::{Hap, RunState};

use crate::common::builder::{NOP, spin};
use crate::common::harness::{RAM_BASE, TestContext};

#[rstest]
#[case::go("go")]
#[case::step("step")]
#[case::halt("halt")]
fn off_core_rejects_run_control(#[case] verb: &str) {
    let mut ctx = TestContext::new().load_program(RAM_BASE, &[NOP]);
    let result = match verb {
        "go" => ctx.cpu.go(),
        "step" => ctx.cpu.step(),
        _ => ctx.cpu.halt(None),
    };

    assert_eq!(result, Err(ControlError::NotPowered));
    assert_eq!(ctx.cpu.state(), RunState::Off);
    assert_eq!(ctx.cpu.step_count(), 0);
    assert_eq!(ctx.cpu.last_halt_message(), "");
}

#[test]
fn power_on_starts_at_reset_vector() {
    let mut ctx = TestContext::new().load_program(RAM_BASE + 0x40, &[NOP]);
    ctx.cpu.reset(false);

    assert_eq!(ctx.cpu.state(), RunState::Normal);
    assert_eq!(ctx.cpu.pc(), RAM_BASE + 0x40);
    assert_eq!(ctx.cpu.npc(), RAM_BASE + 0x40);
}

#[test]
fn off_core_consumes_no_slots() {
    let mut ctx = TestContext::new().load_program(RAM_BASE, &[spin()]);
    assert_eq!(ctx.run(10), 0);
    assert_eq!(ctx.cpu.step_count(), 0);
}

#[test]
fn reset_deassert_on_powered_core_keeps_position() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[NOP, NOP, spin()])
        .power_on();
    let _ = ctx.run(2);
    ctx.cpu.reset(false);
    assert_eq!(ctx.cpu.state(), RunState::Normal);
    assert_eq!(ctx.cpu.npc(), RAM_BASE + 8);
}

#[test]
fn reset_assert_powers_off_and_clears_status() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    ctx.cpu.write_csr(csr::MSTATUS, csr::MSTATUS_MIE);
    ctx.cpu.push_stack_trace(RAM_BASE, RAM_BASE + 0x10);

    ctx.cpu.reset(true);

    assert_eq!(ctx.cpu.state(), RunState::Off);
    assert_eq!(ctx.cpu.read_csr(csr::MSTATUS), 0);
    assert_eq!(ctx.cpu.stack_trace_count(), 0);
    assert_eq!(ctx.cpu.go(), Err(ControlError::NotPowered));
}

#[test]
fn halt_writes_diagnostic_line() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[NOP, spin()])
        .power_on();
    let _ = ctx.run(1);
    ctx.cpu.halt(Some("requested")).unwrap();

    assert_eq!(ctx.cpu.state(), RunState::Halted);
    assert_eq!(
        ctx.cpu.last_halt_message(),
        "[1] pc:0000000080000000: 00000013 \trequested"
    );
    let cause = (ctx.cpu.read_csr(csr::DCSR) >> csr::DCSR_CAUSE_SHIFT) & csr::DCSR_CAUSE_MASK;
    assert_eq!(cause, csr::DCSR_CAUSE_HALTREQ);
}

#[test]
fn halt_without_reason_uses_default_text() {
    let mut ctx = TestContext::new().load_program(RAM_BASE, &[NOP]).halted();
    assert!(ctx.cpu.last_halt_message().ends_with("CPU halted"));
    ctx.cpu.go().unwrap();
    assert_eq!(ctx.cpu.state(), RunState::Normal);
}

#[test]
fn haps_follow_power_and_halt_transitions() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = TestContext::new().load_program(RAM_BASE, &[NOP, spin()]);
    let sink = Arc::clone(&seen);
    ctx.cpu
        .add_hap_handler(Box::new(move |hap| sink.lock().unwrap().push(hap.clone())));

    ctx.cpu.reset(false);
    let _ = ctx.run(1);
    ctx.cpu.halt(None).unwrap();
    ctx.cpu.reset(true);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Hap::CpuTurnedOn,
            Hap::Halt {
                step: 1,
                pc: RAM_BASE
            },
            Hap::CpuTurnedOff,
        ]
    );
}

#[test]
fn halted_core_holds_position() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[NOP, NOP, spin()])
        .halted();
    assert_eq!(ctx.run(5), 0);
    assert_eq!(ctx.cpu.pc(), RAM_BASE);
    assert_eq!(ctx.cpu.npc(), RAM_BASE);

    ctx.cpu.go().unwrap();
    assert_eq!(ctx.run(2), 2);
    assert_eq!(ctx.cpu.npc(), RAM_BASE + 8);
}
