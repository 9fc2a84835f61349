use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rvdbg_core::common::LoaderError;
use rvdbg_core::core::arch::csr;
use rvdbg_core::isa::privileged::cause::interrupt;
use rvdbg_core::{Config, Hap, RunState, Simulator};
use tempfile::TempDir;

use super::loader::{elf_image, words};
use crate::common::builder::{EBREAK, InstructionBuilder, inc, spin};
use crate::common::harness::{RAM_BASE, init_tracing};

/// Writes `bytes` to a file in a fresh temporary directory.
fn image(bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.bin");
    std::fs::write(&path, bytes).unwrap();
    (dir, path)
}

fn simulator() -> Simulator {
    init_tracing();
    Simulator::new(&Config::default())
}

fn hello_uart() -> Vec<u32> {
    vec![
        InstructionBuilder::new().lui(5, 0x10000).build(),
        InstructionBuilder::new().addi(6, 0, 65).build(),
        InstructionBuilder::new().sb(5, 6, 0).build(),
        spin(),
    ]
}

#[test]
fn raw_program_prints_through_the_uart() {
    let (_dir, path) = image(&words(&hello_uart()));
    let mut sim = simulator();

    assert_eq!(sim.load(&path, None).unwrap(), RAM_BASE);
    sim.power_on();
    assert_eq!(sim.run_steps(10), 10);

    assert_eq!(sim.take_uart_output(), b"A");
    assert!(sim.take_uart_output().is_empty());
}

#[test]
fn raw_program_at_an_explicit_address() {
    let (_dir, path) = image(&words(&[inc(1), spin()]));
    let mut sim = simulator();
    let at = RAM_BASE + 0x2000;

    assert_eq!(sim.load(&path, Some(at)).unwrap(), at);
    sim.power_on();
    assert_eq!(sim.cpu.npc(), at);
    let _ = sim.run_steps(1);
    assert_eq!(sim.cpu.read_gpr(1), 1);
}

#[test]
fn elf_entry_becomes_the_reset_vector() {
    let code = words(&[inc(1), inc(1), spin()]);
    let (_dir, path) = image(&elf_image(RAM_BASE + 0x104, RAM_BASE + 0x100, &code));
    let mut sim = simulator();

    assert_eq!(sim.load(&path, None).unwrap(), RAM_BASE + 0x104);
    sim.power_on();
    let _ = sim.run_steps(3);
    assert_eq!(sim.cpu.read_gpr(1), 1);
}

#[test]
fn run_steps_stops_once_halted() {
    let (_dir, path) = image(&words(&[inc(1), EBREAK, spin()]));
    let mut sim = simulator();
    let _ = sim.load(&path, None).unwrap();

    assert_eq!(sim.run_steps(100), 0);

    sim.power_on();
    assert_eq!(sim.run_steps(100), 2);
    assert_eq!(sim.cpu.state(), RunState::Halted);
}

#[test]
fn missing_image_is_an_io_error() {
    let mut sim = simulator();
    let err = sim
        .load(std::path::Path::new("/nonexistent/prog.bin"), None)
        .unwrap_err();
    assert!(matches!(err, LoaderError::Io { .. }));
    assert!(err.to_string().starts_with("could not read '/nonexistent/prog.bin'"));
}

#[test]
fn console_session_over_a_loaded_program() {
    let (_dir, path) = image(&words(&[inc(10), inc(10), inc(10), spin()]));
    let mut sim = simulator();
    let _ = sim.load(&path, None).unwrap();

    assert!(sim.execute("status").unwrap().starts_with("state: off"));
    sim.power_on();
    let _ = sim.execute("br add 0x80000008").unwrap();
    let _ = sim.run_steps(10);
    assert_eq!(sim.cpu.state(), RunState::Halted);
    assert_eq!(sim.execute("reg a0").unwrap(), "a0 = 0x0000000000000002");

    let _ = sim.execute("br rm 0x80000008").unwrap();
    let _ = sim.execute("go").unwrap();
    let _ = sim.run_steps(1);
    assert_eq!(sim.cpu.read_gpr(10), 3);
}

#[test]
fn custom_configuration_is_honoured() {
    init_tracing();
    let config = Config::from_json(
        r#"{ "general": { "stepping_count": 2 }, "system": { "ram_base": 1073741824, "ram_size": 4096 } }"#,
    )
    .unwrap();
    let (_dir, path) = image(&words(&[inc(1), inc(1), inc(1), spin()]));
    let mut sim = Simulator::new(&config);

    assert_eq!(sim.load(&path, None).unwrap(), 0x4000_0000);
    sim.power_on();
    let _ = sim.execute("halt").unwrap();
    let out = sim.execute("step").unwrap();
    assert!(out.ends_with("Stepping breakpoint"));
    assert_eq!(sim.cpu.read_gpr(1), 2);
    assert_eq!(sim.config().system.ram_size, 4096);
}

fn mtime(sim: &mut Simulator) -> Option<u64> {
    sim.cpu
        .system_bus()
        .as_bus_mut()
        .and_then(|bus| bus.find_clint())
        .map(|clint| clint.mtime())
}

#[test]
fn config_done_reaches_observers_registered_after_construction() {
    let mut sim = simulator();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    sim.cpu
        .add_hap_handler(Box::new(move |hap| sink.lock().unwrap().push(hap.clone())));

    sim.power_on();
    sim.config_done();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Hap::ConfigDone, Hap::CpuTurnedOn]
    );
}

#[test]
fn guest_programmed_timer_interrupt_is_taken() {
    const HANDLER: u64 = RAM_BASE + 0x40;
    let mut program = vec![
        InstructionBuilder::new().lui(5, 0x2004).build(),
        InstructionBuilder::new().addi(6, 0, 3).build(),
        InstructionBuilder::new().sd(5, 6, 0).build(),
        spin(),
    ];
    program.resize(16, 0);
    program.extend([inc(7), spin()]);
    let (_dir, path) = image(&words(&program));
    let mut sim = simulator();
    let _ = sim.load(&path, None).unwrap();
    sim.power_on();
    sim.cpu.write_csr(csr::MTVEC, HANDLER);
    sim.cpu.write_csr(csr::MIE, csr::MIP_MTIP);
    sim.cpu.write_csr(csr::MSTATUS, csr::MSTATUS_MIE);

    assert_eq!(sim.run_steps(29), 29);
    assert_eq!(sim.cpu.read_csr(csr::MIP) & csr::MIP_MTIP, 0);
    assert_eq!(sim.cpu.npc(), RAM_BASE + 12);

    let _ = sim.run_steps(1);
    assert_eq!(mtime(&mut sim), Some(3));
    assert_eq!(sim.cpu.read_csr(csr::MCAUSE), interrupt::MACHINE_TIMER);
    assert_eq!(sim.cpu.read_csr(csr::MEPC), RAM_BASE + 12);
    assert_eq!(sim.cpu.npc(), HANDLER);

    let _ = sim.run_steps(1);
    assert_eq!(sim.cpu.read_gpr(7), 1);
}

#[test]
fn timer_is_frozen_while_off_and_resumes_after_power_on() {
    let (_dir, path) = image(&words(&[spin()]));
    let mut sim = simulator();
    let _ = sim.load(&path, None).unwrap();
    sim.power_on();
    let _ = sim.run_steps(20);
    assert_eq!(mtime(&mut sim), Some(2));

    sim.cpu.reset(true);
    assert!(sim.cpu.events().is_empty());
    assert_eq!(sim.run_steps(50), 0);
    assert_eq!(mtime(&mut sim), Some(2));

    sim.cpu.reset(false);
    let _ = sim.run_steps(10);
    assert_eq!(mtime(&mut sim), Some(3));
}
