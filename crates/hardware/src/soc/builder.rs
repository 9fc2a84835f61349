//! System bus construction.
//!
//! This module assembles the bus the core runs on. It performs:
//! 1. **RAM:** A zero-filled `Memory` at `ram_base`.
//! 2. **UART:** A transmit-only 16550 at `uart_base`.
//! 3. **CLINT:** The step-driven timer at `clint_base`.
//! 4. **Validation:** Warns when RAM overlaps the DSU window, which the bus does not decode.

use crate::common::constants::{DSU_REGION_COUNT, DSU_REGION_SIZE};
use crate::config::SystemConfig;
use crate::soc::devices::{Clint, Uart};
use crate::soc::interconnect::Bus;
use crate::soc::memory::Memory;

/// Builds the system bus described by `config`.
///
/// # Arguments
///
/// * `config` - Memory map (RAM, UART, CLINT and DSU placement).
///
/// # Returns
///
/// A `Bus` with RAM, UART and CLINT attached.
pub fn build_bus(config: &SystemConfig) -> Bus {
    let mut bus = Bus::new();

    let ram_end = config.ram_base.saturating_add(config.ram_size as u64);
    let dsu_end = config.dsu_base + DSU_REGION_SIZE * u64::from(DSU_REGION_COUNT);
    if config.ram_base < dsu_end && config.dsu_base < ram_end {
        tracing::warn!(
            ram_base = format_args!("{:#x}", config.ram_base),
            ram_size = config.ram_size,
            dsu_base = format_args!("{:#x}", config.dsu_base),
            "RAM overlaps the DSU window; DSU addresses will reach RAM"
        );
    }

    bus.add_device(Box::new(Memory::new(config.ram_base, config.ram_size)));
    bus.add_device(Box::new(Uart::new(config.uart_base)));
    bus.add_device(Box::new(Clint::new(config.clint_base, config.clint_divider)));
    bus
}
