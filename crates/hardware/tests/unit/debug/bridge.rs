use std::sync::mpsc;

use pretty_assertions::assert_eq;
use rvdbg_core::common::DebugPortError;
use rvdbg_core::debug::DebugPortTransaction;
use rvdbg_core::debug::dsu::region;

use crate::common::builder::spin;
use crate::common::harness::{RAM_BASE, TestContext};

#[test]
fn off_core_answers_before_submit_returns() {
    let mut ctx = TestContext::new();
    ctx.set_reg(5, 0xfeed);
    let (tx, rx) = mpsc::channel();

    ctx.cpu
        .submit_debug(
            DebugPortTransaction::read(region::REGS, 5),
            Box::new(move |t| tx.send(t.rdata).unwrap()),
        )
        .unwrap();

    assert_eq!(rx.try_recv().unwrap(), 0xfeed);
    assert!(!ctx.cpu.debug_port_pending());
    assert_eq!(ctx.cpu.step_count(), 0);
    assert_eq!(ctx.cpu.stats().debug_transactions, 1);
}

#[test]
fn running_core_answers_at_the_top_of_the_next_step() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    let (tx, rx) = mpsc::channel();

    ctx.cpu
        .submit_debug(
            DebugPortTransaction::write(region::REGS, 7, 42),
            Box::new(move |t| tx.send(t.write).unwrap()),
        )
        .unwrap();
    assert!(ctx.cpu.debug_port_pending());
    assert!(rx.try_recv().is_err());
    assert_eq!(ctx.get_reg(7), 0);

    assert!(ctx.cpu.update_pipeline());
    assert!(rx.try_recv().unwrap());
    assert_eq!(ctx.get_reg(7), 42);
    assert!(!ctx.cpu.debug_port_pending());
}

#[test]
fn second_submission_is_refused_while_pending() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    ctx.cpu
        .submit_debug(DebugPortTransaction::read(region::REGS, 1), Box::new(|_| {}))
        .unwrap();

    let rejected = DebugPortTransaction::write(region::CONTROL, 0, 1);
    let err = ctx
        .cpu
        .submit_debug(rejected, Box::new(|_| panic!("rejected callback must not run")))
        .unwrap_err();
    let DebugPortError::Busy(trans, _) = err;
    assert_eq!(*trans, rejected);

    let _ = ctx.cpu.update_pipeline();
    assert!(!ctx.cpu.debug_port_pending());
    assert!(ctx.cpu.is_running());
}

#[test]
fn power_off_keeps_submissions_in_order() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .power_on();
    ctx.set_reg(1, 0x11);
    ctx.set_reg(2, 0x22);
    let (tx, rx) = mpsc::channel();
    let first = tx.clone();

    ctx.cpu
        .submit_debug(
            DebugPortTransaction::read(region::REGS, 1),
            Box::new(move |t| first.send(("first", t.rdata)).unwrap()),
        )
        .unwrap();
    ctx.cpu.reset(true);
    ctx.cpu
        .submit_debug(
            DebugPortTransaction::read(region::REGS, 2),
            Box::new(move |t| tx.send(("second", t.rdata)).unwrap()),
        )
        .unwrap();

    assert!(!ctx.cpu.debug_port_pending());
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![("first", 0x11), ("second", 0x22)]
    );
    assert!(!ctx.cpu.update_pipeline());
    assert_eq!(ctx.cpu.stats().debug_transactions, 2);
}

#[test]
fn halted_core_services_without_consuming_a_slot() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin()])
        .halted();
    let (tx, rx) = mpsc::channel();
    ctx.cpu
        .submit_debug(
            DebugPortTransaction::read(region::CSR, 0x7b1),
            Box::new(move |t| tx.send(t.rdata).unwrap()),
        )
        .unwrap();

    assert!(!ctx.cpu.update_pipeline());
    assert_eq!(rx.try_recv().unwrap(), RAM_BASE);
    assert_eq!(ctx.cpu.step_count(), 0);
}

#[test]
fn unknown_region_reads_zero() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.read(9, 0), 0);
    ctx.write(9, 0, 5);
    assert_eq!(ctx.cpu.stats().debug_transactions, 2);
}
