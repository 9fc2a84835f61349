use pretty_assertions::assert_eq;
use rvdbg_core::common::BusError;
use rvdbg_core::config::SystemConfig;
use rvdbg_core::soc::{Bus, MasterId, MemoryTransaction, MemoryTransactionPort, build_bus};

use crate::common::builder::{InstructionBuilder, spin};
use crate::common::harness::{RAM_BASE, TestContext};

const UART_BASE: u64 = 0x1000_0000;

fn read(bus: &mut Bus, addr: u64, size: usize) -> Result<u64, BusError> {
    let mut t = MemoryTransaction::read(addr, size, MasterId::Cpu);
    bus.b_transport(&mut t).map(|()| t.rdata)
}

#[test]
fn default_map_routes_ram_and_uart() {
    let mut bus = build_bus(&SystemConfig::default());
    assert_eq!(read(&mut bus, UART_BASE + 5, 1), Ok(0x60));
    assert_eq!(read(&mut bus, RAM_BASE + 512 * 1024 - 8, 8), Ok(0));
    assert_eq!(
        read(&mut bus, RAM_BASE + 512 * 1024, 4),
        Err(BusError::Unmapped(RAM_BASE + 512 * 1024))
    );
    assert_eq!(read(&mut bus, 0x8008_0000, 8), Err(BusError::Unmapped(0x8008_0000)));
}

#[test]
fn custom_map_moves_devices() {
    let config = SystemConfig {
        ram_base: 0x4000_0000,
        ram_size: 0x1000,
        uart_base: 0x2000_0000,
        ..SystemConfig::default()
    };
    let mut bus = build_bus(&config);
    assert!(bus.is_valid_address(0x4000_0ffc));
    assert!(!bus.is_valid_address(0x4000_1000));
    assert!(!bus.is_valid_address(RAM_BASE));
    assert_eq!(read(&mut bus, 0x2000_0005, 1), Ok(0x60));
}

#[test]
fn program_writes_reach_the_uart() {
    let mut ctx = TestContext::new()
        .load_program(
            RAM_BASE,
            &[
                InstructionBuilder::new().lui(5, 0x10000).build(),
                InstructionBuilder::new().addi(6, 0, i32::from(b'o')).build(),
                InstructionBuilder::new().sb(5, 6, 0).build(),
                InstructionBuilder::new().addi(6, 0, i32::from(b'k')).build(),
                InstructionBuilder::new().sb(5, 6, 0).build(),
                spin(),
            ],
        )
        .power_on();
    let _ = ctx.run(6);

    let bus = ctx.cpu.system_bus().as_bus_mut().unwrap();
    let uart = bus.find_uart().unwrap();
    assert_eq!(uart.take_output(), b"ok");
}

#[test]
fn uart_scratch_register_holds_a_byte() {
    let mut bus = build_bus(&SystemConfig::default());
    let mut w = MemoryTransaction::write(UART_BASE + 7, 1, 0xa5, MasterId::Debug);
    bus.b_transport(&mut w).unwrap();
    assert_eq!(read(&mut bus, UART_BASE + 7, 1), Ok(0xa5));
}
