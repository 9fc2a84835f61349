//! Debugger-facing components.
//!
//! This module contains everything an external debugger touches:
//! 1. **Debug Port:** The single-slot transaction bridge and the core-side servicing of the
//!    four DSU regions.
//! 2. **Debug Module:** RISC-V debug-module registers, abstract commands and system-bus access.
//! 3. **Register Map:** DSU register names, addresses and bit-field views.
//! 4. **Console:** The text command surface.
//! 5. **Trace:** Per-instruction trace records and sinks.

/// Debug-port transaction slot.
pub mod bridge;

/// Text command console.
pub mod console;

/// Debug-module registers (region 3).
pub mod dmi;

/// DSU register-name and address map.
pub mod dsu;

/// Bit-field register views.
pub mod regs;

/// Region servicing for debug-port transactions.
pub mod service;

/// Instruction trace records and sinks.
pub mod trace;

pub use bridge::{DebugPortBridge, DebugPortTransaction, ResponseCallback};
pub use console::Console;
pub use dsu::DsuMap;
