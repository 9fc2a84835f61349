//! Memory-mapped I/O devices.
//!
//! Peripherals attached to the system bus next to RAM.

/// Core Local Interruptor (timer and software interrupts).
pub mod clint;

/// UART 16550-compatible serial port (transmit side).
pub mod uart;

pub use clint::Clint;
pub use uart::Uart;

pub use crate::soc::traits::Device;
