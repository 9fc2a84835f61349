//! System-on-Chip (SoC) Components.
//!
//! This module organizes the components behind the core's memory ports: the transaction port
//! contract, the system bus, RAM, MMIO devices, interrupt lines, and the builder assembling them.

/// System bus construction from configuration.
pub mod builder;

/// Memory-mapped I/O device implementations.
pub mod devices;

/// System bus interconnect and routing.
pub mod interconnect;

/// Interrupt lines from devices to the core.
pub mod irq;

/// Flat RAM device.
pub mod memory;

/// Memory transaction port contract.
pub mod port;

/// Device trait definitions for MMIO access.
pub mod traits;

pub use builder::build_bus;
pub use interconnect::Bus;
pub use irq::IrqLines;
pub use port::{MasterId, MemoryTransaction, MemoryTransactionPort};
