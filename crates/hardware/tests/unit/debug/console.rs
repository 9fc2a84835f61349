use pretty_assertions::assert_eq;
use rstest::rstest;
use rvdbg_core::RunState;
use rvdbg_core::common::{ConsoleError, ControlError};
use rvdbg_core::debug::Console;

use crate::common::builder::{EBREAK, NOP, inc, spin};
use crate::common::harness::{RAM_BASE, TestContext};

fn halted_program() -> (TestContext, Console) {
    let ctx = TestContext::new()
        .load_program(RAM_BASE, &[inc(1), inc(1), inc(1), inc(1), NOP, spin()])
        .halted();
    (ctx, Console::default())
}

#[rstest]
#[case("halt")]
#[case("go")]
#[case("step")]
fn run_control_on_an_off_core_is_rejected(#[case] line: &str) {
    let mut ctx = TestContext::new();
    let err = Console::default().execute(&mut ctx.cpu, line).unwrap_err();
    assert!(matches!(err, ConsoleError::Control(ControlError::NotPowered)));
    assert_eq!(err.to_string(), "CPU is turned-off");
    assert_eq!(ctx.cpu.state(), RunState::Off);
}

#[test]
fn reg_write_then_read() {
    let (mut ctx, mut console) = halted_program();
    assert_eq!(console.execute(&mut ctx.cpu, "reg a0 0x1234").unwrap(), "");
    assert_eq!(ctx.get_reg(10), 0x1234);
    assert_eq!(
        console.execute(&mut ctx.cpu, "reg a0").unwrap(),
        "a0 = 0x0000000000001234"
    );
    assert_eq!(
        console.execute(&mut ctx.cpu, "reg pc").unwrap(),
        format!("pc = {RAM_BASE:#018x}")
    );
}

#[rstest]
#[case("reg bogus", "register 'bogus' not found")]
#[case("frobnicate", "unknown command 'frobnicate'")]
#[case("reg a0 zz", "invalid number 'zz'")]
#[case("mem", "malformed command: mem ")]
#[case("br add", "malformed command: br add")]
fn bad_lines_come_back_as_text(#[case] line: &str, #[case] message: &str) {
    let (mut ctx, mut console) = halted_program();
    let err = console.execute(&mut ctx.cpu, line).unwrap_err();
    assert_eq!(err.to_string(), message);
}

#[test]
fn empty_line_is_malformed() {
    let (mut ctx, mut console) = halted_program();
    assert!(matches!(
        console.execute(&mut ctx.cpu, "   "),
        Err(ConsoleError::Malformed(_))
    ));
}

#[test]
fn step_runs_to_completion_and_reports_the_halt() {
    let (mut ctx, mut console) = halted_program();
    let out = console.execute(&mut ctx.cpu, "step 3").unwrap();
    assert!(out.starts_with("[3] pc:"));
    assert!(out.ends_with("Stepping breakpoint"));
    assert_eq!(ctx.get_reg(1), 3);

    let out = console.execute(&mut ctx.cpu, "step").unwrap();
    assert!(out.starts_with("[4] pc:"));
    assert_eq!(ctx.get_reg(1), 4);
}

#[test]
fn halt_and_go() {
    let (mut ctx, mut console) = halted_program();
    assert_eq!(console.execute(&mut ctx.cpu, "c").unwrap(), "");
    assert_eq!(ctx.cpu.state(), RunState::Normal);
    let out = console.execute(&mut ctx.cpu, "stop").unwrap();
    assert!(out.ends_with("CPU halted"));
    assert_eq!(ctx.cpu.state(), RunState::Halted);
}

#[test]
fn breakpoint_add_list_remove() {
    let (mut ctx, mut console) = halted_program();
    assert_eq!(console.execute(&mut ctx.cpu, "br").unwrap(), "no breakpoints");

    assert_eq!(
        console.execute(&mut ctx.cpu, "br add 0x80000004").unwrap(),
        "sw breakpoint set at 0x80000004"
    );
    assert_eq!(
        console.execute(&mut ctx.cpu, "br add 0x80000010 hw").unwrap(),
        "hw breakpoint set at 0x80000010"
    );
    let listing = console.execute(&mut ctx.cpu, "br").unwrap();
    assert_eq!(listing.lines().count(), 2);
    assert!(listing.contains("0x0000000080000004 sw"));
    assert!(listing.contains("0x0000000080000010 hw"));

    assert_eq!(
        console.execute(&mut ctx.cpu, "br rm 0x80000004").unwrap(),
        "breakpoint removed at 0x80000004"
    );
    assert_eq!(ctx.peek32(RAM_BASE + 4), inc(1));
}

#[test]
fn breakpoint_on_unmapped_address_is_rejected() {
    let (mut ctx, mut console) = halted_program();
    assert!(matches!(
        console.execute(&mut ctx.cpu, "br add 0x20000000"),
        Err(ConsoleError::BreakpointRejected(0x2000_0000))
    ));
}

#[test]
fn breakpoint_on_a_running_core_resumes_it() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[spin(), NOP, NOP])
        .power_on();
    let mut console = Console::default();

    let _ = console.execute(&mut ctx.cpu, "br add 0x80000008").unwrap();

    assert!(ctx.cpu.is_running());
    assert_eq!(ctx.peek32(RAM_BASE + 8), EBREAK);
}

#[test]
fn breakpoint_on_a_stepping_core_keeps_the_step_budget() {
    let (mut ctx, mut console) = halted_program();
    ctx.cpu.step_by(1000).unwrap();
    let _ = ctx.run(1);
    let budget = ctx.cpu.step_budget();

    assert_eq!(
        console.execute(&mut ctx.cpu, "br add 0x80000100 hw").unwrap(),
        "hw breakpoint set at 0x80000100"
    );

    assert_eq!(ctx.cpu.state(), RunState::Stepping);
    assert_eq!(ctx.cpu.step_budget(), budget);
}

#[test]
fn removing_a_missing_breakpoint_is_rejected() {
    let (mut ctx, mut console) = halted_program();
    let _ = console.execute(&mut ctx.cpu, "br add 0x80000004").unwrap();

    assert!(matches!(
        console.execute(&mut ctx.cpu, "br rm 0x80000008"),
        Err(ConsoleError::BreakpointRejected(0x8000_0008))
    ));
    assert!(ctx.cpu.breakpoints().contains(RAM_BASE + 4));
    assert_eq!(ctx.cpu.state(), RunState::Halted);
}

#[test]
fn mem_dumps_bytes() {
    let mut ctx = TestContext::new()
        .load_program(RAM_BASE, &[NOP, NOP])
        .halted();
    let out = Console::default().execute(&mut ctx.cpu, "mem 0x80000000 8").unwrap();
    assert_eq!(out, "0000000080000000: 13 00 00 00 13 00 00 00");
}

#[test]
fn mem_wraps_at_sixteen_bytes() {
    let (mut ctx, mut console) = halted_program();
    let out = console.execute(&mut ctx.cpu, "mem 0x80000000 20").unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("0000000080000010: "));
    assert_eq!(lines[1].split_whitespace().count(), 5);
}

#[test]
fn mem_on_unmapped_address_reports_bus_error() {
    let (mut ctx, mut console) = halted_program();
    let err = console.execute(&mut ctx.cpu, "mem 0x20000000 4").unwrap_err();
    assert!(matches!(err, ConsoleError::SystemBus(2, 0x2000_0000)));

    // The error is cleared by the next dump.
    assert!(console.execute(&mut ctx.cpu, "mem 0x80000000 4").is_ok());
}

#[test]
fn disas_marks_breakpoints() {
    let (mut ctx, mut console) = halted_program();
    let _ = console.execute(&mut ctx.cpu, "br add 0x80000004 hw").unwrap();

    let out = console.execute(&mut ctx.cpu, "disas 0x80000000 2").unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        format!(" 0000000080000000: {:08x}  addi ra, ra, 1", inc(1))
    );
    assert!(lines[1].starts_with("*0000000080000004: "));
}

#[test]
fn status_and_reset() {
    let (mut ctx, mut console) = halted_program();
    let status = console.execute(&mut ctx.cpu, "status").unwrap();
    assert!(status.starts_with("state: halted\n"));
    assert!(status.contains("last halt: [0]"));

    assert_eq!(
        console.execute(&mut ctx.cpu, "reset").unwrap(),
        "reset, pc=0x80000000"
    );
    assert_eq!(ctx.cpu.state(), RunState::Normal);
}

#[test]
fn help_lists_register_names() {
    let (mut ctx, mut console) = halted_program();
    let help = console.execute(&mut ctx.cpu, "help").unwrap();
    assert!(help.contains("registers:"));
    assert!(help.contains(" mstatus"));
    assert!(help.contains(" dmstatus"));
}
